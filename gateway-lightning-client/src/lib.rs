pub mod client;
pub mod error;
pub mod http;
pub mod mock;

pub use client::{decode_invoice, DecodedInvoice, Invoice, LightningClient, PaymentReceived, PaymentResult};
pub use error::{LightningError, Result};
pub use http::HttpLightningClient;
pub use mock::{MockLightningBackend, MockLightningNetwork};
