//! TableChat interaction layer: HTTP transport and external collaborators.

pub mod client;
pub mod gateway;

pub use client::{ChatApi, HttpChatClient};
pub use gateway::{CheckoutRequest, LazyGateway, PaymentGateway};
