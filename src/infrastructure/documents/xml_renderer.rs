use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::domain::invoice::{InvoiceDocument, errors::ArtifactError};

fn xml_io(e: std::io::Error) -> ArtifactError {
  ArtifactError::Xml(format!("XML write error: {e}"))
}

/// Thin element writer over quick-xml with two-space indentation.
struct XmlWriter {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
  fn new() -> Result<Self, ArtifactError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
      .map_err(xml_io)?;
    Ok(Self { writer })
  }

  fn start(&mut self, name: &str) -> Result<&mut Self, ArtifactError> {
    self
      .writer
      .write_event(Event::Start(BytesStart::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  fn start_with_attrs(
    &mut self,
    name: &str,
    attrs: &[(&str, &str)],
  ) -> Result<&mut Self, ArtifactError> {
    let mut elem = BytesStart::new(name);
    for (k, v) in attrs {
      elem.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Start(elem)).map_err(xml_io)?;
    Ok(self)
  }

  fn end(&mut self, name: &str) -> Result<&mut Self, ArtifactError> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(name)))
      .map_err(xml_io)?;
    Ok(self)
  }

  fn text(&mut self, name: &str, text: &str) -> Result<&mut Self, ArtifactError> {
    self.start(name)?;
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(xml_io)?;
    self.end(name)
  }

  /// Skips the element entirely when the value is absent.
  fn optional(&mut self, name: &str, text: Option<&str>) -> Result<&mut Self, ArtifactError> {
    match text {
      Some(value) => self.text(name, value),
      None => Ok(self),
    }
  }

  fn amount(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, ArtifactError> {
    self.text(name, &format!("{:.2}", amount))
  }

  fn into_bytes(self) -> Vec<u8> {
    self.writer.into_inner().into_inner()
  }
}

/// Renders the `<factura>` document that accompanies the PDF.
pub fn render_xml(document: &InvoiceDocument) -> Result<Vec<u8>, ArtifactError> {
  let invoice = &document.invoice;
  let emitter = &document.emitter;
  let customer = &document.customer;
  let mut xml = XmlWriter::new()?;

  xml.start_with_attrs("factura", &[("id", &invoice.id.to_string())])?;

  xml.start("emisor")?;
  xml
    .text("nombre", &emitter.name)?
    .text("ruc", &emitter.ruc_display())?
    .text("email", &emitter.email)?
    .optional("telefono", emitter.phone.as_deref())?
    .optional("direccion", emitter.address_line.as_deref())?
    .optional("codigoUbicacion", emitter.ubi_code.as_deref())?;
  xml.end("emisor")?;

  xml.start("cliente")?;
  xml
    .text("nombre", &customer.name)?
    .text("email", &customer.email)?
    .optional("ruc", customer.tax_id.as_deref())?
    .optional("telefono", customer.phone.as_deref())?
    .optional("direccion", customer.address_line.as_deref())?
    .optional("codigoUbicacion", customer.ubi_code.as_deref())?;
  xml.end("cliente")?;

  xml.start("documento")?;
  xml
    .text("numero", &invoice.document_number)?
    .text("fecha", &invoice.created_at.to_rfc3339())?
    .text("ptoFac", &invoice.issuing_point)?
    .text("tipo", invoice.document_kind.as_str())?
    .text("ambiente", &invoice.environment.to_string())?
    .text("tipoEmision", &invoice.emission_type)?
    .text("tipoDocumento", &invoice.document_code)?
    .text("estado", invoice.status.as_str())?
    .optional("cufe", invoice.authority.cufe.as_deref())?;
  if let Some(reference) = &invoice.reference {
    xml.start("referencia")?;
    xml
      .text("cufe", &reference.cufe)?
      .text("numero", &reference.number)?
      .text("ptoFac", &reference.issuing_point)?;
    xml.end("referencia")?;
  }
  xml.end("documento")?;

  xml.start("items")?;
  for item in &document.items {
    xml.start_with_attrs("item", &[("linea", &item.line_no.to_string())])?;
    xml
      .optional("codigo", item.sku.as_deref())?
      .text("descripcion", &item.description)?
      .text("cantidad", &item.quantity.normalize().to_string())?
      .amount("precioUnitario", item.unit_price)?
      .text("tasaItbms", item.tax_rate.code())?
      .optional("cpbsAbr", item.cpbs_abr.as_deref())?
      .optional("cpbsCmp", item.cpbs_cmp.as_deref())?
      .amount("total", item.line_total)?;
    xml.end("item")?;
  }
  xml.end("items")?;

  xml.start("totales")?;
  xml
    .amount("subtotal", invoice.subtotal)?
    .amount("itbms", invoice.itbms_amount)?
    .amount("total", invoice.total_amount)?;
  xml.end("totales")?;

  xml.end("factura")?;
  Ok(xml.into_bytes())
}
