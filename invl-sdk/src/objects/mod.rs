pub mod admin;
pub mod id;
pub mod ledger;
pub mod webhook;

pub use admin::{
    AdjustmentKind, AdjustmentRequest, CreateReceiptRequest, LedgerTallyResponse, LineChangeRequest,
    ListLedgerQuery, MutationResponse, ReceiptKind, ReceiptResponse, ReceiptStatus, clamp_pagination,
};
pub use ledger::{LedgerActivity, LedgerEntryResponse, WebhookAck};
pub use webhook::{
    FulfillmentLineItem, FulfillmentPayload, InventoryLevelPayload, OrderPayload, WebhookTopic,
};
