// src/utils/menu.rs
//
// Static canteen menu. Order lines are priced by name lookup at submission:
// exact case-insensitive match first, then substring. Unmatched names keep
// price 0 rather than failing the order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub name: &'static str,
    /// Unit price in rupees.
    pub price: i32,
}

pub const MENU: &[MenuItem] = &[
    MenuItem { name: "Idli", price: 30 },
    MenuItem { name: "Masala Dosa", price: 60 },
    MenuItem { name: "Vada Pav", price: 25 },
    MenuItem { name: "Samosa", price: 15 },
    MenuItem { name: "Veg Fried Rice", price: 80 },
    MenuItem { name: "Paneer Roll", price: 70 },
    MenuItem { name: "Veg Thali", price: 90 },
    MenuItem { name: "Tea", price: 10 },
    MenuItem { name: "Coffee", price: 20 },
    MenuItem { name: "Lemon Juice", price: 25 },
];

/// Look up a menu entry by order-line name, case-insensitively. An exact
/// match wins over a substring match in either direction.
pub fn find_menu_item(name: &str) -> Option<&'static MenuItem> {
    let query = name.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    MENU.iter()
        .find(|item| item.name.to_lowercase() == query)
        .or_else(|| {
            MENU.iter().find(|item| {
                let menu_name = item.name.to_lowercase();
                menu_name.contains(&query) || query.contains(&menu_name)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        let item = find_menu_item("masala dosa").unwrap();
        assert_eq!(item.name, "Masala Dosa");
        assert_eq!(item.price, 60);
    }

    #[test]
    fn substring_matches_resolve_to_full_entry() {
        let item = find_menu_item("dosa").unwrap();
        assert_eq!(item.name, "Masala Dosa");
        assert_eq!(item.price, 60);
    }

    #[test]
    fn exact_match_wins_over_substring() {
        // "Tea" is a substring of nothing else, but make sure an exact entry
        // is preferred when the query equals a full name.
        let item = find_menu_item("TEA").unwrap();
        assert_eq!(item.name, "Tea");
    }

    #[test]
    fn unknown_items_stay_unresolved() {
        assert!(find_menu_item("pizza").is_none());
        assert!(find_menu_item("   ").is_none());
    }
}
