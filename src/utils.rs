pub fn format_amount(amount: f64) -> String {
  format!("{amount:.2}")
}

/// Replaces every `{key}` placeholder; unknown placeholders are kept as is.
pub fn render_template(template: &str, values: &[(&str, String)]) -> String {
  values.iter().fold(template.to_string(), |text, (key, value)| {
    text.replace(&format!("{{{key}}}"), value)
  })
}

pub fn escape_html(raw: &str) -> String {
  let mut escaped = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      other => escaped.push(other),
    }
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_render_template() {
    let text = render_template(
      "{agency} owes {balance} for {month}/{year} {unknown}",
      &[
        ("agency", "Agence Sud".into()),
        ("balance", format_amount(130.0)),
        ("month", "6".into()),
        ("year", "2025".into()),
      ],
    );
    assert_eq!(text, "Agence Sud owes 130.00 for 6/2025 {unknown}");
  }

  #[test]
  fn test_escape_html() {
    assert_eq!(
      escape_html(r#"<b>"Tom & Jerry's"</b>"#),
      "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
    );
  }
}
