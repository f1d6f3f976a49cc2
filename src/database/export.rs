use std::fmt::{self, Display};

use serde::Serialize;

use super::schema::ShoppingListRow;

/*
Shopping list export

name (unit) - amount
egg (pcs) - 2
flour (g) - 300
sugar (g) - 50
*/

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShoppingList {
    rows: Vec<ShoppingListRow>,
}

impl ShoppingList {
    /// Rows are rendered in the order given. `list_shopping_cart` already
    /// returns them alphabetically.
    pub fn new(rows: Vec<ShoppingListRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{} ({}) - {}", row.name, row.measurement_unit, row.amount)?;
        }
        Ok(())
    }
}

impl From<ShoppingList> for String {
    fn from(value: ShoppingList) -> Self {
        value.to_string()
    }
}
