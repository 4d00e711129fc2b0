//! Decoder for EDI 832 (price/sales catalog) style payloads.
//!
//! Segments are terminated by `~`, elements separated by `*`. Only the
//! item-level segments carry data we normalize:
//!
//! - `LIN` opens a line item; qualifier/value pairs follow the line counter
//!   (`VN` vendor item number, `UP`/`UA` UPC).
//! - `PID` carries the item description.
//! - `CTP` carries a price; the `RES` (resale) qualifier wins when several
//!   prices are listed.
//! - `QTY` carries quantity available (`33` qualifier, but any integer
//!   quantity is accepted).
//!
//! Envelope segments (`ISA`, `GS`, `ST`, `SE`, `GE`, `IEA`, `BCT`, `CTT`)
//! are recognized and skipped. Anything undecodable is a parse failure -
//! never a silently dropped line item.

use tracing::debug;

use crate::error::FeedError;
use crate::records::CanonicalProduct;

const SEGMENT_TERMINATOR: char = '~';
const ELEMENT_SEPARATOR: char = '*';

const ENVELOPE_SEGMENTS: &[&str] = &[
    "ISA", "GS", "ST", "SE", "GE", "IEA", "BCT", "CTT", "DTM", "REF", "N1",
];

/// A line item mid-decode. Price stays optional until the item closes so a
/// missing `CTP` is distinguishable from a real zero price.
struct PendingItem {
    product: CanonicalProduct,
    price: Option<f64>,
    priced_by_resale: bool,
    /// Index of the opening LIN segment, for diagnostics.
    segment: usize,
}

impl PendingItem {
    fn finish(self) -> Result<CanonicalProduct, FeedError> {
        let mut product = self.product;
        product.price = self.price.ok_or_else(|| {
            segment_error(
                self.segment,
                "LIN",
                &format!("line item {:?} has no price segment", product.sku),
            )
        })?;
        Ok(product)
    }
}

/// Decode an 832-style catalog payload into canonical products.
pub fn decode_catalog(payload: &str) -> Result<Vec<CanonicalProduct>, FeedError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(FeedError::Parse("empty EDI payload".to_string()));
    }

    let mut products: Vec<CanonicalProduct> = Vec::new();
    let mut current: Option<PendingItem> = None;

    for (idx, raw) in trimmed.split(SEGMENT_TERMINATOR).enumerate() {
        let segment = raw.trim();
        if segment.is_empty() {
            continue;
        }
        let elements: Vec<&str> = segment.split(ELEMENT_SEPARATOR).collect();
        let tag = elements[0].trim();

        match tag {
            "LIN" => {
                if let Some(done) = current.take() {
                    products.push(done.finish()?);
                }
                current = Some(PendingItem {
                    product: decode_lin(idx, &elements)?,
                    price: None,
                    priced_by_resale: false,
                    segment: idx,
                });
            }
            "PID" => {
                let item = expect_item(idx, tag, &mut current)?;
                let description = elements
                    .iter()
                    .skip(1)
                    .rev()
                    .find(|e| !e.trim().is_empty())
                    .map(|e| e.trim().to_string())
                    .ok_or_else(|| segment_error(idx, tag, "no description element"))?;
                if item.product.name.is_empty() {
                    item.product.name = description.clone();
                }
                item.product.description = Some(description);
            }
            "CTP" => {
                let qualifier = elements.get(2).map(|e| e.trim()).unwrap_or_default();
                let raw_price = elements
                    .get(3)
                    .map(|e| e.trim())
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| segment_error(idx, tag, "missing price element"))?;
                let price: f64 = raw_price
                    .parse()
                    .map_err(|_| segment_error(idx, tag, &format!("invalid price {raw_price:?}")))?;
                let item = expect_item(idx, tag, &mut current)?;
                match qualifier {
                    "RES" => {
                        item.price = Some(price);
                        item.priced_by_resale = true;
                    }
                    "NET" => item.product.cost = Some(price),
                    _ if !item.priced_by_resale => item.price = Some(price),
                    _ => {}
                }
            }
            "QTY" => {
                let raw_qty = elements
                    .get(2)
                    .map(|e| e.trim())
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| segment_error(idx, tag, "missing quantity element"))?;
                let quantity: i64 = raw_qty.parse().map_err(|_| {
                    segment_error(idx, tag, &format!("invalid quantity {raw_qty:?}"))
                })?;
                expect_item(idx, tag, &mut current)?.product.quantity = quantity;
            }
            _ if ENVELOPE_SEGMENTS.contains(&tag) => {}
            _ => {
                return Err(segment_error(idx, tag, "unrecognized segment"));
            }
        }
    }

    if let Some(done) = current.take() {
        products.push(done.finish()?);
    }

    debug!(target = "edi", items = products.len(), "catalog payload decoded");
    Ok(products)
}

fn decode_lin(idx: usize, elements: &[&str]) -> Result<CanonicalProduct, FeedError> {
    if elements.len() < 4 {
        return Err(segment_error(idx, "LIN", "truncated line item segment"));
    }

    let mut product = CanonicalProduct::default();
    // Qualifier/value pairs start after the line counter element.
    for pair in elements[2..].chunks(2) {
        let [qualifier, value] = pair else {
            return Err(segment_error(idx, "LIN", "dangling id qualifier"));
        };
        match qualifier.trim() {
            "VN" | "VP" | "IN" => product.sku = value.trim().to_string(),
            "UP" | "UA" | "UK" => product.upc = Some(value.trim().to_string()),
            other => {
                return Err(segment_error(
                    idx,
                    "LIN",
                    &format!("unsupported id qualifier {other:?}"),
                ));
            }
        }
    }

    if product.sku.is_empty() {
        return Err(segment_error(idx, "LIN", "line item without a vendor item number"));
    }
    Ok(product)
}

fn expect_item<'a>(
    idx: usize,
    tag: &str,
    current: &'a mut Option<PendingItem>,
) -> Result<&'a mut PendingItem, FeedError> {
    current
        .as_mut()
        .ok_or_else(|| segment_error(idx, tag, "segment outside of a line item"))
}

fn segment_error(idx: usize, tag: &str, detail: &str) -> FeedError {
    FeedError::Parse(format!("EDI segment {idx} ({tag}): {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ST*832*0001~\
        BCT*PC*CAT-2024~\
        LIN*1*VN*CEN-1001*UP*012345678905~\
        PID*F*08***Galvanized Bucket 5Gal~\
        CTP**RES*12.99~\
        CTP**NET*8.40~\
        QTY*33*144~\
        LIN*2*VN*CEN-2002~\
        PID*F*08***Fence Post Cap~\
        CTP**RES*3.25~\
        QTY*33*0~\
        CTT*2~\
        SE*12*0001~";

    #[test]
    fn decodes_line_items_with_price_cost_and_quantity() {
        let products = decode_catalog(SAMPLE).unwrap();
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.sku, "CEN-1001");
        assert_eq!(first.name, "Galvanized Bucket 5Gal");
        assert_eq!(first.price, 12.99);
        assert_eq!(first.cost, Some(8.40));
        assert_eq!(first.quantity, 144);
        assert_eq!(first.upc.as_deref(), Some("012345678905"));

        let second = &products[1];
        assert_eq!(second.sku, "CEN-2002");
        assert_eq!(second.quantity, 0);
        assert_eq!(second.upc, None);
    }

    #[test]
    fn resale_price_wins_over_unqualified() {
        let payload = "LIN*1*VN*A~CTP***5.00~CTP**RES*4.00~CTP***9.00~";
        let products = decode_catalog(payload).unwrap();
        assert_eq!(products[0].price, 4.00);
    }

    #[test]
    fn line_item_without_a_price_segment_fails_closed() {
        // A priceless item is a broken feed, not a free product.
        let err = decode_catalog("LIN*1*VN*A~QTY*33*5~").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
        assert!(err.to_string().contains("no price segment"), "got: {err}");

        // Cost alone does not stand in for a price.
        let err = decode_catalog("LIN*1*VN*A~CTP**NET*2.00~").unwrap_err();
        assert!(err.to_string().contains("no price segment"));
    }

    #[test]
    fn truncated_line_item_is_a_parse_error() {
        let err = decode_catalog("LIN*1~").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
        assert!(err.to_string().contains("LIN"));
    }

    #[test]
    fn item_segment_outside_line_item_is_an_error() {
        let err = decode_catalog("CTP**RES*4.00~").unwrap_err();
        assert!(err.to_string().contains("outside of a line item"));
    }

    #[test]
    fn invalid_price_is_an_error() {
        let err = decode_catalog("LIN*1*VN*A~CTP**RES*cheap~").unwrap_err();
        assert!(err.to_string().contains("invalid price"));
    }

    #[test]
    fn empty_payload_is_an_error() {
        assert!(decode_catalog("").is_err());
        assert!(decode_catalog("   \n").is_err());
    }

    #[test]
    fn unrecognized_segment_is_an_error() {
        let err = decode_catalog("LIN*1*VN*A~ZZZ*1~").unwrap_err();
        assert!(err.to_string().contains("unrecognized segment"));
    }
}
