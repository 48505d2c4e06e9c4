pub mod ledger_entry;
pub mod stock_receipt;

use invl_sdk::objects::LedgerActivity as SdkLedgerActivity;

/// Cause of a ledger entry, for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `invl_sdk::objects::LedgerActivity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "ledger_activity")]
pub enum LedgerActivity {
    ManualAdjustment,
    OrderSales,
    PurchaseReceive,
    PurchaseCancel,
    TransferReceive,
    TransferCancel,
    CountCorrection,
    /// A change was observed but its cause is not known yet.
    GenericWebhook,
}

impl LedgerActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerActivity::ManualAdjustment => "manual_adjustment",
            LedgerActivity::OrderSales => "order_sales",
            LedgerActivity::PurchaseReceive => "purchase_receive",
            LedgerActivity::PurchaseCancel => "purchase_cancel",
            LedgerActivity::TransferReceive => "transfer_receive",
            LedgerActivity::TransferCancel => "transfer_cancel",
            LedgerActivity::CountCorrection => "count_correction",
            LedgerActivity::GenericWebhook => "generic_webhook",
        }
    }

    /// Provisional rows may be upgraded in place by the reconciliation matcher.
    pub fn is_provisional(self) -> bool {
        matches!(self, LedgerActivity::GenericWebhook)
    }

    pub fn is_authoritative(self) -> bool {
        !self.is_provisional()
    }
}

impl std::fmt::Display for LedgerActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LedgerActivity> for SdkLedgerActivity {
    fn from(value: LedgerActivity) -> Self {
        match value {
            LedgerActivity::ManualAdjustment => SdkLedgerActivity::ManualAdjustment,
            LedgerActivity::OrderSales => SdkLedgerActivity::OrderSales,
            LedgerActivity::PurchaseReceive => SdkLedgerActivity::PurchaseReceive,
            LedgerActivity::PurchaseCancel => SdkLedgerActivity::PurchaseCancel,
            LedgerActivity::TransferReceive => SdkLedgerActivity::TransferReceive,
            LedgerActivity::TransferCancel => SdkLedgerActivity::TransferCancel,
            LedgerActivity::CountCorrection => SdkLedgerActivity::CountCorrection,
            LedgerActivity::GenericWebhook => SdkLedgerActivity::GenericWebhook,
        }
    }
}

impl From<SdkLedgerActivity> for LedgerActivity {
    fn from(value: SdkLedgerActivity) -> Self {
        match value {
            SdkLedgerActivity::ManualAdjustment => LedgerActivity::ManualAdjustment,
            SdkLedgerActivity::OrderSales => LedgerActivity::OrderSales,
            SdkLedgerActivity::PurchaseReceive => LedgerActivity::PurchaseReceive,
            SdkLedgerActivity::PurchaseCancel => LedgerActivity::PurchaseCancel,
            SdkLedgerActivity::TransferReceive => LedgerActivity::TransferReceive,
            SdkLedgerActivity::TransferCancel => LedgerActivity::TransferCancel,
            SdkLedgerActivity::CountCorrection => LedgerActivity::CountCorrection,
            SdkLedgerActivity::GenericWebhook => LedgerActivity::GenericWebhook,
        }
    }
}
