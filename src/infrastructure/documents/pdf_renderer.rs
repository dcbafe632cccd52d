use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use rust_decimal::Decimal;

use crate::domain::invoice::{InvoiceDocument, errors::ArtifactError, value_objects::DocumentStatus};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 14.0;
const FOOTER_SPACE: f32 = 110.0;

// Column x offsets of the item table
const COL_LINE: f32 = MARGIN;
const COL_DESCRIPTION: f32 = MARGIN + 40.0;
const COL_QUANTITY: f32 = 330.0;
const COL_PRICE: f32 = 400.0;
const COL_TOTAL: f32 = 480.0;

fn pdf_err(e: impl std::fmt::Display) -> ArtifactError {
  ArtifactError::Pdf(e.to_string())
}

/// Helvetica with WinAnsiEncoding takes single-byte Latin-1 strings.
fn latin1(text: &str) -> Object {
  let bytes = text
    .chars()
    .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
    .collect::<Vec<u8>>();
  Object::String(bytes, StringFormat::Literal)
}

fn money(amount: Decimal) -> String {
  format!("{:.2}", amount)
}

/// Accumulates drawing operations page by page.
struct PageWriter {
  pages: Vec<Vec<Operation>>,
  y: f32,
}

impl PageWriter {
  fn new() -> Self {
    Self {
      pages: vec![Vec::new()],
      y: PAGE_HEIGHT - MARGIN,
    }
  }

  fn current(&mut self) -> &mut Vec<Operation> {
    // pages is never empty
    let last = self.pages.len() - 1;
    &mut self.pages[last]
  }

  fn text(&mut self, x: f32, font: &str, size: f32, text: &str) {
    let y = self.y;
    let ops = self.current();
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![latin1(text)]));
    ops.push(Operation::new("ET", vec![]));
  }

  fn line(&mut self, font: &str, size: f32, text: &str) {
    self.text(MARGIN, font, size, text);
    self.advance(LINE_HEIGHT);
  }

  fn rule(&mut self) {
    let y = self.y + LINE_HEIGHT - 4.0;
    let ops = self.current();
    ops.push(Operation::new("m", vec![MARGIN.into(), y.into()]));
    ops.push(Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]));
    ops.push(Operation::new("S", vec![]));
  }

  fn advance(&mut self, amount: f32) {
    self.y -= amount;
  }

  /// Starts a new page when fewer than `needed` points remain.
  fn ensure_space(&mut self, needed: f32) -> bool {
    if self.y - needed < MARGIN {
      self.pages.push(Vec::new());
      self.y = PAGE_HEIGHT - MARGIN;
      return true;
    }
    false
  }
}

/// Renders an A4 invoice with the built-in Helvetica fonts.
pub fn render_pdf(document: &InvoiceDocument) -> Result<Vec<u8>, ArtifactError> {
  let invoice = &document.invoice;
  let emitter = &document.emitter;
  let customer = &document.customer;
  let mut page = PageWriter::new();

  page.line(
    "F2",
    18.0,
    &format!("FACTURA - {}", invoice.document_kind.label()),
  );
  page.advance(4.0);
  page.line("F1", 11.0, &format!("No. {}", invoice.document_number));
  page.line(
    "F1",
    11.0,
    &format!("Fecha: {}", invoice.created_at.format("%d/%m/%Y")),
  );
  page.line(
    "F1",
    11.0,
    &format!("Punto de facturación: {}", invoice.issuing_point),
  );
  page.advance(LINE_HEIGHT);

  page.line("F2", 12.0, "EMISOR");
  page.line("F1", 10.0, &emitter.name);
  page.line("F1", 10.0, &format!("RUC: {}", emitter.ruc_display()));
  if let Some(address) = &emitter.address_line {
    page.line("F1", 10.0, address);
  }
  page.line("F1", 10.0, &emitter.email);
  page.advance(LINE_HEIGHT);

  page.line("F2", 12.0, "CLIENTE");
  page.line("F1", 10.0, &customer.name);
  if let Some(tax_id) = &customer.tax_id {
    page.line("F1", 10.0, &format!("RUC/Cédula: {}", tax_id));
  }
  page.line("F1", 10.0, &customer.email);
  if let Some(address) = &customer.address_line {
    page.line("F1", 10.0, address);
  }
  page.advance(LINE_HEIGHT);

  table_header(&mut page);
  for item in &document.items {
    if page.ensure_space(LINE_HEIGHT + FOOTER_SPACE) {
      table_header(&mut page);
    }
    page.text(COL_LINE, "F1", 9.0, &item.line_no.to_string());
    page.text(COL_DESCRIPTION, "F1", 9.0, &truncate(&item.description, 48));
    page.text(COL_QUANTITY, "F1", 9.0, &item.quantity.normalize().to_string());
    page.text(COL_PRICE, "F1", 9.0, &money(item.unit_price));
    page.text(COL_TOTAL, "F1", 9.0, &money(item.line_total));
    page.advance(LINE_HEIGHT);
  }

  page.ensure_space(FOOTER_SPACE);
  page.advance(LINE_HEIGHT);
  page.rule();
  page.text(COL_PRICE, "F1", 10.0, "Subtotal:");
  page.text(COL_TOTAL, "F1", 10.0, &money(invoice.subtotal));
  page.advance(LINE_HEIGHT);
  page.text(COL_PRICE, "F1", 10.0, "ITBMS:");
  page.text(COL_TOTAL, "F1", 10.0, &money(invoice.itbms_amount));
  page.advance(LINE_HEIGHT);
  page.text(COL_PRICE, "F2", 11.0, "Total:");
  page.text(COL_TOTAL, "F2", 11.0, &money(invoice.total_amount));
  page.advance(LINE_HEIGHT * 2.0);

  if invoice.status == DocumentStatus::Authorized {
    if let Some(cufe) = &invoice.authority.cufe {
      page.line("F1", 8.0, &format!("CUFE: {}", cufe));
    }
  }

  assemble(page.pages)
}

fn table_header(page: &mut PageWriter) {
  page.text(COL_LINE, "F2", 9.0, "Línea");
  page.text(COL_DESCRIPTION, "F2", 9.0, "Descripción");
  page.text(COL_QUANTITY, "F2", 9.0, "Cantidad");
  page.text(COL_PRICE, "F2", 9.0, "Precio Unit.");
  page.text(COL_TOTAL, "F2", 9.0, "Total");
  page.advance(LINE_HEIGHT);
  page.rule();
}

fn truncate(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }
  let mut cut = text.chars().take(max_chars - 3).collect::<String>();
  cut.push_str("...");
  cut
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, ArtifactError> {
  let mut doc = Document::with_version("1.5");
  let pages_id = doc.new_object_id();

  let regular_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica",
    "Encoding" => "WinAnsiEncoding",
  });
  let bold_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica-Bold",
    "Encoding" => "WinAnsiEncoding",
  });
  let resources_id = doc.add_object(dictionary! {
    "Font" => dictionary! {
      "F1" => regular_id,
      "F2" => bold_id,
    },
  });

  let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
  for operations in pages {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_err)?));
    let page_id: ObjectId = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
    });
    kids.push(page_id.into());
  }

  let count = kids.len() as i64;
  doc.objects.insert(
    pages_id,
    Object::Dictionary(dictionary! {
      "Type" => "Pages",
      "Kids" => kids,
      "Count" => count,
      "Resources" => resources_id,
      "MediaBox" => vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(PAGE_WIDTH),
        Object::Real(PAGE_HEIGHT),
      ],
    }),
  );

  let catalog_id = doc.add_object(dictionary! {
    "Type" => "Catalog",
    "Pages" => pages_id,
  });
  doc.trailer.set("Root", catalog_id);

  let mut output = Vec::new();
  doc.save_to(&mut output).map_err(pdf_err)?;
  Ok(output)
}
