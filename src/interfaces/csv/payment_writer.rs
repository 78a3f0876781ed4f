use crate::domain::payment::PaymentRecord;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

#[derive(Serialize)]
struct PaymentRow<'a> {
    id: &'a str,
    status: &'a str,
    amount: String,
    currency: &'a str,
    payment_method: &'a str,
    created_at: &'a str,
}

impl<'a> From<&'a PaymentRecord> for PaymentRow<'a> {
    fn from(record: &'a PaymentRecord) -> Self {
        let amount = match &record.amount {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            id: record.id.as_str(),
            status: record.status.as_ref().map(|s| s.as_str()).unwrap_or_default(),
            amount,
            currency: record.currency.as_deref().unwrap_or_default(),
            payment_method: record
                .payment_method
                .as_ref()
                .map(|m| m.as_str())
                .unwrap_or_default(),
            created_at: record.created_at.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes payment history as CSV, one row per payment.
pub struct PaymentHistoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentHistoryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header followed by every record, then flushes.
    pub fn write_payments<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a PaymentRecord>,
    {
        let mut wrote_any = false;
        for record in records {
            self.writer.serialize(PaymentRow::from(record))?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer.write_record([
                "id",
                "status",
                "amount",
                "currency",
                "payment_method",
                "created_at",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
