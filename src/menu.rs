//! Options menu entries.

use std::fmt;

use crate::model::OfficeThing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    NewThing,
    ChangeFloor,
    Delete,
    EditName,
    Rotate,
    SignOut,
}

impl MenuItem {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NewThing => "New thing",
            Self::ChangeFloor => "Change floor",
            Self::Delete => "Delete",
            Self::EditName => "Edit name",
            Self::Rotate => "Rotate",
            Self::SignOut => "Sign out",
        }
    }

    /// Command that performs this entry on the main screen.
    #[must_use]
    pub fn command_hint(self) -> &'static str {
        match self {
            Self::NewThing => "new <kind>",
            Self::ChangeFloor => "floor <pattern>",
            Self::Delete => "delete",
            Self::EditName => "rename <name>",
            Self::Rotate => "rotate",
            Self::SignOut => "logout",
        }
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entries for the current selection. Desks alone get "Edit name".
#[must_use]
pub fn options_menu(selected: Option<&OfficeThing>) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::NewThing, MenuItem::ChangeFloor];
    if let Some(thing) = selected {
        items.push(MenuItem::Delete);
        if thing.is_editable() {
            items.push(MenuItem::EditName);
        }
        items.push(MenuItem::Rotate);
    }
    items.push(MenuItem::SignOut);
    items
}

#[cfg(test)]
#[path = "menu_test.rs"]
mod tests;
