/// Transaction types for the precursor ledger
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Free-form metadata attached to a transaction.
pub type Details = Map<String, Value>;

/// Inventory event recorded by a transaction. The set is open: unknown
/// labels are kept verbatim so they hash and persist exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Receive,
    Shipment,
    Consumption,
    Adjustment,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Receive => "RECEIVE",
            EventType::Shipment => "SHIPMENT",
            EventType::Consumption => "CONSUMPTION",
            EventType::Adjustment => "ADJUSTMENT",
            EventType::Other(label) => label,
        }
    }
}

impl From<String> for EventType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "RECEIVE" => EventType::Receive,
            "SHIPMENT" => EventType::Shipment,
            "CONSUMPTION" => EventType::Consumption,
            "ADJUSTMENT" => EventType::Adjustment,
            _ => EventType::Other(label),
        }
    }
}

impl From<&str> for EventType {
    fn from(label: &str) -> Self {
        EventType::from(label.to_string())
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> Self {
        match event {
            EventType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller-supplied part of a transaction. The pool adds the timestamp
/// when the transaction is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub sender_urn: String,
    pub recipient_urn: String,
    pub chemical_urn: String,
    /// Kept as a JSON number so `5` and `5.0` stay distinct in the hash.
    pub quantity: Number,
    pub unit: String,
    pub event_type: EventType,
    pub details: Details,
}

/// A submitted inventory record. Immutable once stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender_urn: String,
    recipient_urn: String,
    chemical_urn: String,
    quantity: Number,
    unit: String,
    event_type: EventType,
    timestamp: String,
    details: Details,
}

impl Transaction {
    /// Build a transaction from submitted fields and its creation time.
    pub fn stamp(fields: NewTransaction, timestamp: impl Into<String>) -> Self {
        Transaction {
            sender_urn: fields.sender_urn,
            recipient_urn: fields.recipient_urn,
            chemical_urn: fields.chemical_urn,
            quantity: fields.quantity,
            unit: fields.unit,
            event_type: fields.event_type,
            timestamp: timestamp.into(),
            details: fields.details,
        }
    }

    pub fn sender_urn(&self) -> &str {
        &self.sender_urn
    }

    pub fn recipient_urn(&self) -> &str {
        &self.recipient_urn
    }

    pub fn chemical_urn(&self) -> &str {
        &self.chemical_urn
    }

    pub fn quantity(&self) -> &Number {
        &self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn details(&self) -> &Details {
        &self.details
    }
}

/// Current local time as recorded on transactions, e.g.
/// `2024-05-01T13:45:10.123456`.
pub fn transaction_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
