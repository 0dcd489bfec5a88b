//! Inline HTML pages: the upload form and the comparison result page.
//!
//! Rendering is plain placeholder substitution; both images are
//! embedded as base64 data URIs so the result page is self-contained.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fragsim::{ComparisonResult, GRID_DIM};

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>fragsim - image comparison</title></head>
<body>
  <h1>Compare an image against the reference</h1>
  <form action="/compare" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Compare (both modes)</button>
  </form>
  <form action="/singlethread" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Single-threaded</button>
  </form>
  <form action="/multithread" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*" required>
    <button type="submit">Multi-threaded</button>
  </form>
</body>
</html>
"#;

/// The upload form served on `GET /`.
pub fn render_upload_form() -> String {
    UPLOAD_FORM.to_string()
}

/// The result page: one section per executed mode, then both images.
pub fn render_comparison_page(
    sections: &[(&str, ComparisonResult)],
    reference_bytes: &[u8],
    uploaded_bytes: &[u8],
) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>fragsim - comparison result</title></head>\n<body>\n",
    );
    page.push_str("  <h1>Comparison result</h1>\n");

    for (label, result) in sections {
        page.push_str(&format!(
            "  <h2>{label}</h2>\n  <p>Total score: <strong>{:.2}</strong> &mdash; {} ms</p>\n",
            result.total_score,
            result.elapsed_ms()
        ));
        page.push_str(&matrix_table(result));
    }

    page.push_str("  <h2>Images</h2>\n");
    page.push_str(&format!(
        "  <figure><figcaption>Reference</figcaption><img src=\"{}\" alt=\"reference\"></figure>\n",
        data_uri(reference_bytes)
    ));
    page.push_str(&format!(
        "  <figure><figcaption>Uploaded</figcaption><img src=\"{}\" alt=\"uploaded\"></figure>\n",
        data_uri(uploaded_bytes)
    ));
    page.push_str("  <p><a href=\"/\">Compare another image</a></p>\n</body>\n</html>\n");
    page
}

/// The 4x4 similarity matrix as an HTML table, two decimals per cell.
fn matrix_table(result: &ComparisonResult) -> String {
    let mut table = String::from("  <table border=\"1\">\n");
    for row in 0..GRID_DIM {
        table.push_str("    <tr>");
        for col in 0..GRID_DIM {
            table.push_str(&format!("<td>{:.2}</td>", result.matrix.cell(row, col)));
        }
        table.push_str("</tr>\n");
    }
    table.push_str("  </table>\n");
    table
}

fn data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Best-effort MIME sniffing for the data URI; the decoders already
/// validated the bytes, this only picks the label.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"\xFF\xD8") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}
