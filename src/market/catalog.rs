#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub id: &'static str,
    pub name: &'static str,
    pub price: f64,
}

const ITEMS: [Item; 3] = [
    Item {
        id: "0001",
        name: "Sneakers",
        price: 10.99,
    },
    Item {
        id: "0002",
        name: "Bag Pack",
        price: 20.99,
    },
    Item {
        id: "0003",
        name: "Shirt",
        price: 12.99,
    },
];

/// Items for sale.
#[must_use]
pub fn items() -> &'static [Item] {
    &ITEMS
}

#[must_use]
pub fn find_item(id: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(items().len(), 3);
        assert_eq!(find_item("0002").map(|i| i.name), Some("Bag Pack"));
        assert!(find_item("0004").is_none());
    }
}
