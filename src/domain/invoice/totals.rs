use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::entities::{InvoiceTotals, LineRequest, NewInvoiceItem};
use super::errors::InvoiceError;
use super::value_objects::{MAX_MONEY, TaxRate, round_money};

/// Largest accepted gap between the computed total and the declared payment.
pub const PAYMENT_TOLERANCE: Decimal = dec!(0.01);

/// Lines with their computed totals plus the document totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedTotals {
  pub items: Vec<NewInvoiceItem>,
  pub totals: InvoiceTotals,
}

/// Pure ITBMS computation over request lines.
pub struct TotalsCalculator;

impl TotalsCalculator {
  /// Line totals are `quantity * unit_price`; tax is accumulated unrounded and
  /// the document totals are rounded to cents once at the end.
  pub fn calculate(lines: &[LineRequest]) -> Result<ComputedTotals, InvoiceError> {
    if lines.is_empty() {
      return Err(InvoiceError::InvalidRequest(
        "At least one item is required".to_string(),
      ));
    }

    let mut subtotal = Decimal::ZERO;
    let mut itbms = Decimal::ZERO;
    let mut items = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
      let line_no = index + 1;
      let tax_rate =
        TaxRate::from_code(&line.tax_rate_code).map_err(|_| InvoiceError::InvalidTaxRate {
          line_no,
          code: line.tax_rate_code.clone(),
        })?;

      let out_of_range = |message: &str| InvoiceError::AmountOutOfRange {
        line_no,
        message: message.to_string(),
      };

      let line_total = line
        .quantity
        .value()
        .checked_mul(line.unit_price.value())
        .filter(|total| round_money(*total) <= MAX_MONEY)
        .ok_or_else(|| out_of_range("line total exceeds the maximum amount"))?;
      subtotal = subtotal
        .checked_add(line_total)
        .filter(|sum| round_money(*sum) <= MAX_MONEY)
        .ok_or_else(|| out_of_range("subtotal exceeds the maximum amount"))?;
      itbms = line_total
        .checked_mul(tax_rate.rate())
        .and_then(|tax| itbms.checked_add(tax))
        .ok_or_else(|| out_of_range("tax exceeds the maximum amount"))?;

      items.push(NewInvoiceItem {
        line_no: line_no as i32,
        sku: line.sku.clone(),
        description: line.description.value().to_string(),
        quantity: line.quantity.value(),
        unit_price: line.unit_price.value(),
        tax_rate,
        cpbs_abr: line.cpbs_abr.clone(),
        cpbs_cmp: line.cpbs_cmp.clone(),
        line_total: round_money(line_total),
      });
    }

    let subtotal = round_money(subtotal);
    let itbms_amount = round_money(itbms);
    let total_amount = subtotal
      .checked_add(itbms_amount)
      .filter(|total| *total <= MAX_MONEY)
      .ok_or_else(|| InvoiceError::AmountOutOfRange {
        line_no: lines.len(),
        message: "document total exceeds the maximum amount".to_string(),
      })?;

    Ok(ComputedTotals {
      items,
      totals: InvoiceTotals {
        subtotal,
        itbms_amount,
        total_amount,
      },
    })
  }

  /// Hard pre-commit gate: the declared payment must match within one cent.
  pub fn verify_payment(totals: &InvoiceTotals, declared: Decimal) -> Result<(), InvoiceError> {
    if (totals.total_amount - declared).abs() > PAYMENT_TOLERANCE {
      return Err(InvoiceError::AmountMismatch {
        computed: totals.total_amount,
        declared,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::value_objects::{LineItemDescription, Quantity, UnitPrice};

  fn line(qty: Decimal, price: Decimal, tax: &str) -> LineRequest {
    LineRequest {
      sku: None,
      description: LineItemDescription::new("Servicio".to_string()).unwrap(),
      quantity: Quantity::new(qty).unwrap(),
      unit_price: UnitPrice::new(price).unwrap(),
      tax_rate_code: tax.to_string(),
      cpbs_abr: None,
      cpbs_cmp: None,
    }
  }

  #[test]
  fn test_mixed_rates_scenario() {
    let computed = TotalsCalculator::calculate(&[
      line(dec!(2), dec!(10.00), "01"),
      line(dec!(1), dec!(5.00), "00"),
    ])
    .unwrap();

    assert_eq!(computed.totals.subtotal, dec!(25.00));
    assert_eq!(computed.totals.itbms_amount, dec!(1.40));
    assert_eq!(computed.totals.total_amount, dec!(26.40));
    assert_eq!(computed.items[0].line_total, dec!(20.00));
    assert_eq!(computed.items[1].line_no, 2);

    assert!(TotalsCalculator::verify_payment(&computed.totals, dec!(26.40)).is_ok());
    assert!(matches!(
      TotalsCalculator::verify_payment(&computed.totals, dec!(20.00)),
      Err(InvoiceError::AmountMismatch { .. })
    ));
  }

  #[test]
  fn test_line_totals_sum_to_subtotal() {
    let computed = TotalsCalculator::calculate(&[
      line(dec!(3), dec!(1.15), "03"),
      line(dec!(0.5), dec!(9.99), "02"),
      line(dec!(7), dec!(0.33), "01"),
    ])
    .unwrap();

    let sum: Decimal = computed.items.iter().map(|i| i.line_total).sum();
    assert!((sum - computed.totals.subtotal).abs() <= PAYMENT_TOLERANCE);
    assert_eq!(
      computed.totals.subtotal + computed.totals.itbms_amount,
      computed.totals.total_amount
    );
  }

  #[test]
  fn test_tolerance_is_one_cent() {
    let totals = InvoiceTotals {
      subtotal: dec!(25.00),
      itbms_amount: dec!(1.40),
      total_amount: dec!(26.40),
    };
    assert!(TotalsCalculator::verify_payment(&totals, dec!(26.41)).is_ok());
    assert!(TotalsCalculator::verify_payment(&totals, dec!(26.39)).is_ok());
    assert!(TotalsCalculator::verify_payment(&totals, dec!(26.42)).is_err());
  }

  #[test]
  fn test_invalid_tax_rate_reports_line() {
    let result = TotalsCalculator::calculate(&[
      line(dec!(1), dec!(1), "00"),
      line(dec!(1), dec!(1), "99"),
    ]);
    match result {
      Err(InvoiceError::InvalidTaxRate { line_no, code }) => {
        assert_eq!(line_no, 2);
        assert_eq!(code, "99");
      }
      other => panic!("expected InvalidTaxRate, got {:?}", other),
    }
  }

  #[test]
  fn test_huge_line_is_rejected_without_overflow() {
    let result = TotalsCalculator::calculate(&[
      line(dec!(1), dec!(1), "00"),
      line(dec!(99999999999999), dec!(999999999999), "01"),
    ]);

    match result {
      Err(InvoiceError::AmountOutOfRange { line_no, .. }) => assert_eq!(line_no, 2),
      other => panic!("expected AmountOutOfRange, got {:?}", other),
    }
  }

  #[test]
  fn test_accumulated_total_must_fit_money_columns() {
    // Each line fits on its own; subtotal plus 15% tax does not
    let result = TotalsCalculator::calculate(&[
      line(dec!(1), dec!(500000000000), "03"),
      line(dec!(1), dec!(400000000000), "03"),
    ]);

    assert!(matches!(
      result,
      Err(InvoiceError::AmountOutOfRange { .. })
    ));
  }

  #[test]
  fn test_empty_items_rejected() {
    assert!(matches!(
      TotalsCalculator::calculate(&[]),
      Err(InvoiceError::InvalidRequest(_))
    ));
  }
}
