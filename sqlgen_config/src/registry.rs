//! Formatter discovery via the `inventory` crate.
//!
//! Formatters register themselves at link time using `inventory::submit!`
//! together with an order. The order decides precedence between formats
//! sharing a file stem: the lowest order is registered first and wins.
//!
//! External crates can register their own formatters simply by depending on
//! `sqlgen_config` and calling `inventory::submit!`.

use crate::formatter::Formatter;

/// Wrapper for registering a `Formatter` with the inventory.
///
/// Uses a static reference since inventory items must be const-constructible.
pub struct RegisteredFormatter {
    pub order: u32,
    pub formatter: &'static dyn Formatter,
}

impl RegisteredFormatter {
    pub const fn new(order: u32, formatter: &'static dyn Formatter) -> Self {
        Self { order, formatter }
    }
}

inventory::collect!(RegisteredFormatter);

/// Collect all registered formatters, lowest order first.
pub fn collect_formatters() -> Vec<&'static dyn Formatter> {
    let mut entries: Vec<&RegisteredFormatter> =
        inventory::iter::<RegisteredFormatter>.into_iter().collect();
    entries.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.formatter.name().cmp(b.formatter.name()))
    });
    entries.into_iter().map(|r| r.formatter).collect()
}
