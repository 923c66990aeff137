//! Terminal rendering of a cart.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use trolley::{items::LineItem, totals::Totals};

/// Write the cart as a table followed by its totals.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cart(mut out: impl io::Write, items: &[LineItem], totals: &Totals) -> io::Result<()> {
    if items.is_empty() {
        writeln!(out, "\nYour cart is empty.")?;

        return write_summary(&mut out, totals);
    }

    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Line", "Qty", "Price", "Savings", "Line Total"]);

    for (idx, item) in items.iter().enumerate() {
        builder.push_record([
            (idx + 1).to_string(),
            describe(item),
            item.cart_id.to_string(),
            item.quantity.to_string(),
            item.price.to_string(),
            savings_cell(item),
            line_total_cell(item),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..7), Alignment::right());

    writeln!(out, "\n{table}")?;

    write_summary(&mut out, totals)
}

fn describe(item: &LineItem) -> String {
    let Some(variant) = item.variant.as_ref().filter(|variant| !variant.is_empty()) else {
        return item.name.clone();
    };

    let options = variant
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}\n{options}", item.name)
}

fn money_cell(minor: Option<i64>, currency: &'static Currency) -> String {
    minor.map_or_else(
        || "-".to_string(),
        |minor| Money::from_minor(minor, currency).to_string(),
    )
}

fn savings_cell(item: &LineItem) -> String {
    match item.line_savings_minor() {
        Some(0) => String::new(),
        savings => money_cell(savings, item.price.currency()),
    }
}

fn line_total_cell(item: &LineItem) -> String {
    money_cell(item.line_total_minor(), item.price.currency())
}

fn write_summary(out: &mut impl io::Write, totals: &Totals) -> io::Result<()> {
    let delivery = if totals.has_free_delivery() {
        "Free".to_string()
    } else {
        totals.delivery_fee.to_string()
    };

    let mut lines = vec![
        ("Items", totals.item_count.to_string()),
        ("Subtotal", totals.subtotal.to_string()),
    ];

    if totals.savings.to_minor_units() > 0 {
        lines.push(("Savings", totals.savings.to_string()));
    }

    lines.push(("Delivery", delivery));
    lines.push(("Total", totals.total.to_string()));

    let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = lines
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or(0);

    for (label, value) in &lines {
        writeln!(out, " {label:<label_width$}  {value:>value_width$}")?;
    }

    if !totals.has_free_delivery() {
        writeln!(
            out,
            "\n Add {} more for free delivery.",
            totals.amount_for_free_delivery
        )?;
    }

    writeln!(out)
}
