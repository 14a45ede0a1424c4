//! Fixed-capacity paging of a ledger's transactions.

use serde::{Deserialize, Serialize};

use argent_types::Transaction;

/// One page of consecutive transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub transactions: Vec<Transaction>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            transactions: Vec::new(),
        }
    }
}

/// A ledger's transactions split into pages of at most `capacity` entries.
/// Every page but the last is full.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shelf {
    capacity: usize,
    pages: Vec<Page>,
}

impl Shelf {
    /// An empty shelf. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pages: Vec::new(),
        }
    }

    pub fn from_transactions<I>(capacity: usize, transactions: I) -> Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut shelf = Self::new(capacity);
        for tx in transactions {
            shelf.append(tx);
        }
        shelf
    }

    /// Add a transaction to the latest page, opening a new one when it is full.
    /// Returns `(page, slot)` of the stored transaction.
    pub fn append(&mut self, tx: Transaction) -> (usize, usize) {
        let needs_page = self
            .pages
            .last()
            .map_or(true, |p| p.transactions.len() >= self.capacity);
        if needs_page {
            self.pages.push(Page::new(self.pages.len()));
        }
        let page_count = self.pages.len();
        let page = &mut self.pages[page_count - 1];
        page.transactions.push(tx);
        (page.number, page.transactions.len() - 1)
    }

    /// The most recently shelved transaction.
    pub fn latest(&self) -> Option<&Transaction> {
        self.pages.last().and_then(|p| p.transactions.last())
    }

    pub fn find_by_hash(&self, hash: &str) -> Option<&Transaction> {
        self.pages
            .iter()
            .rev()
            .flat_map(|p| p.transactions.iter().rev())
            .find(|tx| tx.hash == hash)
    }

    /// `(page, slot)` of a position in ledger order.
    pub fn position_of(&self, index: usize) -> (usize, usize) {
        (index / self.capacity, index % self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.transactions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.latest().is_none()
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.pages
            .into_iter()
            .flat_map(|p| p.transactions.into_iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argent_types::{Address, Currency, TxBody};

    fn tx(n: u64) -> Transaction {
        let mut tx = Transaction::new(
            TxBody::Send {
                balance: n,
                currency: Currency::native(),
                origin: Address::new("a"),
                destination: Address::new("b"),
            },
            None,
        );
        tx.hash = format!("0{n:04}");
        tx
    }

    #[test]
    fn pages_fill_to_capacity() {
        let shelf = Shelf::from_transactions(3, (0..7).map(tx));
        let sizes: Vec<usize> = shelf.pages().iter().map(|p| p.transactions.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(shelf.len(), 7);
        assert_eq!(shelf.pages()[2].number, 2);
    }

    #[test]
    fn append_reports_position() {
        let mut shelf = Shelf::new(2);
        assert_eq!(shelf.append(tx(0)), (0, 0));
        assert_eq!(shelf.append(tx(1)), (0, 1));
        assert_eq!(shelf.append(tx(2)), (1, 0));
        assert_eq!(shelf.position_of(2), (1, 0));
    }

    #[test]
    fn latest_and_lookup() {
        let shelf = Shelf::from_transactions(2, (0..5).map(tx));
        assert_eq!(shelf.latest().unwrap().hash, "00004");
        assert_eq!(shelf.find_by_hash("00001").unwrap().balance(), Some(1));
        assert!(shelf.find_by_hash("09999").is_none());
    }

    #[test]
    fn empty_shelf() {
        let shelf = Shelf::new(0);
        assert!(shelf.is_empty());
        assert_eq!(shelf.capacity(), 1);
        assert!(shelf.latest().is_none());
    }

    #[test]
    fn order_is_preserved() {
        let shelf = Shelf::from_transactions(4, (0..9).map(tx));
        let hashes: Vec<String> = shelf.into_transactions().into_iter().map(|t| t.hash).collect();
        let expected: Vec<String> = (0..9).map(|n| format!("0{n:04}")).collect();
        assert_eq!(hashes, expected);
    }
}
