//! Pending transaction pool

use crate::transaction::{transaction_timestamp, NewTransaction, Transaction};

/// Transactions submitted but not yet mined, in submission order.
///
/// The pool itself is not synchronized; the owning [`Blockchain`] is the
/// single writer and callers share it behind one lock.
///
/// [`Blockchain`]: crate::blockchain::Blockchain
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `fields` with the current time and queue the transaction.
    pub fn submit(&mut self, fields: NewTransaction) -> &Transaction {
        self.push(Transaction::stamp(fields, transaction_timestamp()))
    }

    /// Queue an already stamped transaction.
    pub fn push(&mut self, tx: Transaction) -> &Transaction {
        self.pending.push(tx);
        &self.pending[self.pending.len() - 1]
    }

    /// Take every pending transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    /// Take the `count` oldest transactions, leaving later submissions queued.
    pub fn take_front(&mut self, count: usize) -> Vec<Transaction> {
        let count = count.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
