use crate::fixed::{Fixed64, checked_div_64, checked_mul_64};
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while constructing or combining catalog values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("item stacks hold different items: {left} and {right}")]
    MismatchedItems { left: String, right: String },
}

/// Reject empty or whitespace-only text fields.
pub(crate) fn require_text(value: &str, what: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidArgument(format!(
            "{what} cannot be empty"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A material that flows through the graph. Equality, ordering, and hashing
/// use the identifier only.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    identifier: String,
    display_name: String,
}

impl Item {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let identifier = identifier.into();
        let display_name = display_name.into();
        require_text(&identifier, "item identifier")?;
        require_text(&display_name, "item display name")?;
        Ok(Self {
            identifier,
            display_name,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier.cmp(&other.identifier)
    }
}

// ---------------------------------------------------------------------------
// ItemStack
// ---------------------------------------------------------------------------

/// A strictly positive amount of one item.
///
/// Arithmetic is only defined between stacks of the same item, and every
/// result must stay positive; operations that would produce a zero or
/// negative stack fail instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    item: Item,
    amount: Fixed64,
}

impl ItemStack {
    pub fn new(item: Item, amount: Fixed64) -> Result<Self, CatalogError> {
        if amount <= Fixed64::ZERO {
            return Err(CatalogError::InvalidArgument(format!(
                "amount of {} must be greater than zero, got {amount}",
                item.identifier
            )));
        }
        Ok(Self { item, amount })
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn amount(&self) -> Fixed64 {
        self.amount
    }

    /// Same item, different amount.
    pub fn with_amount(&self, amount: Fixed64) -> Result<Self, CatalogError> {
        Self::new(self.item.clone(), amount)
    }

    pub fn try_add(&self, other: &ItemStack) -> Result<Self, CatalogError> {
        self.ensure_same_item(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| overflow("addition"))?;
        self.with_amount(sum)
    }

    /// Subtract `other`; the remainder must stay positive.
    pub fn try_sub(&self, other: &ItemStack) -> Result<Self, CatalogError> {
        self.ensure_same_item(other)?;
        let diff = self.amount - other.amount;
        if diff <= Fixed64::ZERO {
            return Err(CatalogError::InvalidArgument(
                "subtraction must result in a positive amount".to_string(),
            ));
        }
        self.with_amount(diff)
    }

    pub fn scale(&self, factor: Fixed64) -> Result<Self, CatalogError> {
        if factor <= Fixed64::ZERO {
            return Err(CatalogError::InvalidArgument(format!(
                "scale factor must be greater than zero, got {factor}"
            )));
        }
        let scaled = checked_mul_64(self.amount, factor).ok_or_else(|| overflow("scaling"))?;
        self.with_amount(scaled)
    }

    pub fn divide(&self, divisor: Fixed64) -> Result<Self, CatalogError> {
        if divisor <= Fixed64::ZERO {
            return Err(CatalogError::InvalidArgument(format!(
                "divisor must be greater than zero, got {divisor}"
            )));
        }
        let quotient = checked_div_64(self.amount, divisor).ok_or_else(|| overflow("division"))?;
        self.with_amount(quotient)
    }

    /// Compare amounts of two stacks of the same item.
    pub fn try_cmp(&self, other: &ItemStack) -> Result<Ordering, CatalogError> {
        self.ensure_same_item(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    fn ensure_same_item(&self, other: &ItemStack) -> Result<(), CatalogError> {
        if self.item != other.item {
            return Err(CatalogError::MismatchedItems {
                left: self.item.identifier.clone(),
                right: other.item.identifier.clone(),
            });
        }
        Ok(())
    }
}

fn overflow(op: &str) -> CatalogError {
    CatalogError::InvalidArgument(format!("item stack {op} overflowed"))
}
