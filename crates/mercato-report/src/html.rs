//! HTML renderer backed by a minijinja template

use crate::artifact::ArtifactFormat;
use crate::document::ReportDocument;
use crate::error::{Error, Result};
use crate::writer::ReportRenderer;
use minijinja::{context, Environment};

const TEMPLATE_NAME: &str = "report.html";

// The `.html` name turns on auto-escaping for every interpolation.
const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body { font-family: "Noto Sans KR", "Malgun Gothic", sans-serif; max-width: 960px; margin: 2rem auto; color: #222; line-height: 1.6; }
h1 { border-bottom: 2px solid #333; padding-bottom: .4rem; }
.meta { color: #666; font-size: .9rem; }
table { border-collapse: collapse; width: 100%; margin: .5rem 0; }
th, td { border: 1px solid #ccc; padding: .35rem .6rem; text-align: left; }
th { background: #f3f3f3; }
.text { white-space: pre-line; }
</style>
</head>
<body>
<h1>{{ title }}</h1>
{% if subtitle %}<p class="meta">{{ subtitle }}</p>{% endif %}
<p class="meta">Generated: {{ generated }}</p>
{% for section in sections %}
<section>
<h2>{{ section.heading }}</h2>
{% for block in section.blocks %}
{% if block.kind == "paragraph" %}
<p class="text">{{ block.text }}</p>
{% elif block.kind == "bullets" %}
<ul>{% for item in block.items %}<li>{{ item }}</li>{% endfor %}</ul>
{% elif block.kind == "table" %}
<table>
<thead><tr>{% for h in block.headers %}<th>{{ h }}</th>{% endfor %}</tr></thead>
<tbody>{% for row in block.rows %}<tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>{% endfor %}</tbody>
</table>
{% endif %}
{% endfor %}
</section>
{% endfor %}
</body>
</html>
"#;

/// HTML renderer
pub struct HtmlRenderer {
    env: Environment<'static>,
}

impl HtmlRenderer {
    /// Create a renderer with the built-in template
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(Self { env })
    }
}

impl std::fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("template", &TEMPLATE_NAME)
            .finish()
    }
}

impl ReportRenderer for HtmlRenderer {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Html
    }

    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| Error::Template(e.to_string()))?;

        let html = template
            .render(context! {
                title => &doc.title,
                subtitle => &doc.subtitle,
                generated => doc.generated_label(),
                sections => &doc.sections,
            })
            .map_err(|e| Error::Template(e.to_string()))?;

        Ok(html.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReportSection;

    fn render(doc: &ReportDocument) -> String {
        let bytes = HtmlRenderer::new().unwrap().render(doc).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_renders_all_block_kinds() {
        let doc = ReportDocument::new("경쟁사 분석")
            .with_subtitle("갤럭시 버즈")
            .section(
                ReportSection::new("요약")
                    .paragraph("첫 줄\n둘째 줄")
                    .bullets(["최저가 189,000원", "판매처 5곳"]),
            )
            .section(ReportSection::new("가격표").table(
                vec!["상품".to_string(), "가격".to_string()],
                vec![vec!["버즈3 프로".to_string(), "219000".to_string()]],
            ));

        let html = render(&doc);
        assert!(html.contains("<h1>경쟁사 분석</h1>"));
        assert!(html.contains("<p class=\"text\">첫 줄\n둘째 줄</p>"));
        assert!(html.contains("<li>판매처 5곳</li>"));
        assert!(html.contains("<th>가격</th>"));
        assert!(html.contains("<td>219000</td>"));
    }

    #[test]
    fn test_escapes_untrusted_text() {
        let doc = ReportDocument::new("<script>alert(1)</script>")
            .section(ReportSection::new("s").paragraph("a & b"));

        let html = render(&doc);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
