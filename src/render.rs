//! Text Rendering
//!
//! Writes a [`CartPageView`] to a terminal: cart lines and the checkout modal as tables, the rest
//! as plain lines.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    payment::PaymentMethod,
    view::{
        CartBody, CartPageView, EmptyCartView, LineView, ModalView, PAGE_TITLE, PrimaryAction,
        SummaryView, TotalsView,
    },
};

/// Errors that can occur when rendering the page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write page")]
    Io(#[from] io::Error),
}

/// Write the page to `out`.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the output can't be written.
pub fn write_page(mut out: impl io::Write, view: &CartPageView) -> Result<(), RenderError> {
    match &view.item_count {
        Some(count) => writeln!(out, "{PAGE_TITLE} ({count})")?,
        None => writeln!(out, "{PAGE_TITLE}")?,
    }

    if let Some(error) = &view.error {
        writeln!(out, "! {error}")?;
    }

    if view.loading {
        writeln!(out, "Loading vendors...")?;
    }

    match &view.body {
        CartBody::Empty(empty) => write_empty(&mut out, empty)?,
        CartBody::Items { lines, summary } => {
            write_lines(&mut out, lines)?;
            write_summary(&mut out, summary)?;
        }
    }

    if let (CartBody::Empty(_), Some(action)) = (&view.body, view.primary_action()) {
        writeln!(out, "\n[{}]", action.label())?;
    }

    if let Some(modal) = &view.modal {
        write_modal(&mut out, modal)?;
    }

    Ok(())
}

fn write_empty(out: &mut impl io::Write, empty: &EmptyCartView) -> Result<(), RenderError> {
    writeln!(out, "\n{}\n{}\n\n[{}]", empty.title, empty.hint, empty.action)?;

    Ok(())
}

fn write_lines(out: &mut impl io::Write, lines: &[LineView]) -> Result<(), RenderError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Product", "Price", "Qty", "Total", "Payment", ""]);

    for line in lines {
        builder.push_record([
            line.id.to_string(),
            line.name.clone(),
            line.unit_price.clone(),
            line.quantity.to_string(),
            line.line_total.clone(),
            line.payment
                .selected
                .map_or(line.payment.placeholder, PaymentMethod::label)
                .to_string(),
            if line.removing {
                "removing...".to_string()
            } else {
                String::new()
            },
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

fn write_summary(out: &mut impl io::Write, summary: &SummaryView) -> Result<(), RenderError> {
    writeln!(out, "\nOrder Summary")?;

    for option in &summary.vendors {
        let mark = if option.selected { "(*)" } else { "( )" };

        match &option.id {
            Some(id) => writeln!(out, "  {mark} {} [{id}]", option.label)?,
            None => writeln!(out, "  {mark} {}", option.label)?,
        }
    }

    if let Some(badge) = &summary.discount_badge {
        writeln!(out, "  {badge}")?;
    }

    write_totals(out, &summary.totals)?;

    match summary.action {
        PrimaryAction::ProceedToCheckout { enabled: false } => {
            writeln!(out, "\n[{}] (select a vendor first)", summary.action.label())?;
        }
        action => writeln!(out, "\n[{}]", action.label())?,
    }

    Ok(())
}

fn write_totals(out: &mut impl io::Write, totals: &TotalsView) -> Result<(), RenderError> {
    writeln!(out)?;

    for row in std::iter::once(&totals.subtotal)
        .chain(totals.discount.as_ref())
        .chain(std::iter::once(&totals.total))
    {
        writeln!(out, "  {:<16} {:>14}", row.label, row.amount)?;
    }

    Ok(())
}

fn write_modal(out: &mut impl io::Write, modal: &ModalView) -> Result<(), RenderError> {
    let mut builder = Builder::default();

    builder.push_record(["Product", "", "Amount"]);

    for row in &modal.rows {
        builder.push_record([row.name.as_str(), row.detail.as_str(), row.amount.as_str()]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..3), Alignment::right());

    writeln!(out, "\nCheckout\n{table}")?;

    write_totals(out, &modal.totals)?;

    let confirm_state = if modal.confirm.enabled { "" } else { " (disabled)" };

    write!(out, "\n[{}]{confirm_state}", modal.confirm.label)?;

    if let Some(cancel) = modal.cancel {
        let cancel_state = if cancel.enabled { "" } else { " (disabled)" };

        write!(out, "  [{}]{cancel_state}", cancel.label)?;
    }

    writeln!(out)?;

    Ok(())
}
