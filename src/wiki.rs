//! Infobox extraction from raw wikitext.
//!
//! Only the first `{{Infobox ...}}` template is read. Field values are
//! stripped of links, emphasis, references, html and nested templates before
//! they are mapped onto a [`CountryRecord`].

use crate::model::CountryRecord;
use crate::rules::RuleViolation;

const NAME_KEYS: &[&str] = &["common_name", "name", "conventional_long_name"];
const CAPITAL_KEYS: &[&str] = &["capital"];
const POPULATION_KEYS: &[&str] = &["population_estimate", "population_census", "population"];
const GDP_KEYS: &[&str] = &[
    "gdp_ppp_per_capita",
    "gdp_nominal_per_capita",
    "gdp_per_capita",
];
const GOVERNMENT_KEYS: &[&str] = &["government_type", "government"];
const CONTINENT_KEYS: &[&str] = &["continent", "region"];

/// Parse the first infobox in `wikitext` into a country record.
pub fn parse_country(wikitext: &str) -> Result<CountryRecord, RuleViolation> {
    let body = infobox_body(wikitext)?;
    let fields = infobox_fields(body);
    let text = |keys: &[&str]| {
        field(&fields, keys)
            .map(strip_markup)
            .filter(|s| !s.is_empty())
    };

    let name = text(NAME_KEYS).ok_or_else(|| RuleViolation::new("infobox has no country name"))?;
    Ok(CountryRecord {
        name,
        capital: text(CAPITAL_KEYS),
        population: field(&fields, POPULATION_KEYS)
            .and_then(parse_number)
            .map(|n| n.round() as i64),
        gdp_per_capita: field(&fields, GDP_KEYS).and_then(parse_number),
        government_type: text(GOVERNMENT_KEYS),
        continent: text(CONTINENT_KEYS),
    })
}

/// First non-empty value among `keys`, in key order.
fn field<'a>(fields: &'a [(String, String)], keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        fields
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    })
}

/// The text between `{{Infobox` and its matching `}}`, excluding the braces.
fn infobox_body(wikitext: &str) -> Result<&str, RuleViolation> {
    let start = wikitext
        .to_ascii_lowercase()
        .find("{{infobox")
        .ok_or_else(|| RuleViolation::new("no infobox found"))?;
    let rest = &wikitext[start..];
    let end = matching(rest, "{{", "}}").ok_or_else(|| RuleViolation::new("unterminated infobox"))?;
    Ok(&rest[2..end - 2])
}

/// `key = value` pairs of the template body. Keys are lowercased; the
/// template name and positional parameters are skipped.
fn infobox_fields(body: &str) -> Vec<(String, String)> {
    split_top_level(body)
        .into_iter()
        .skip(1)
        .filter_map(|field| {
            let (key, value) = field.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

/// Byte offset just past the delimiter closing the `open` at the start of
/// `text`.
fn matching(text: &str, open: &str, close: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with(open) {
            depth += 1;
            i += open.len();
        } else if rest.starts_with(close) {
            depth = depth.saturating_sub(1);
            i += close.len();
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// Split on `|` outside of `[[...]]` and `{{...}}`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut templates, mut links) = (0usize, 0usize);
    let mut segment_start = 0;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("{{") {
            templates += 1;
            i += 2;
        } else if rest.starts_with("}}") {
            templates = templates.saturating_sub(1);
            i += 2;
        } else if rest.starts_with("[[") {
            links += 1;
            i += 2;
        } else if rest.starts_with("]]") {
            links = links.saturating_sub(1);
            i += 2;
        } else if rest.starts_with('|') && templates == 0 && links == 0 {
            parts.push(&text[segment_start..i]);
            i += 1;
            segment_start = i;
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    parts.push(&text[segment_start..]);
    parts
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Link labels nested deeper than this are copied through unexpanded.
const MAX_LINK_DEPTH: usize = 8;

/// Reduce a field value to plain text.
pub fn strip_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    strip_into(value, 0, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_into(value: &str, depth: usize, out: &mut String) {
    let last_close = value.rfind('>');
    let mut i = 0;
    while i < value.len() {
        let rest = &value[i..];
        let in_tag = rest.starts_with('<') && last_close.is_some_and(|close| close > i);
        if rest.starts_with("<!--") {
            i += rest.find("-->").map_or(rest.len(), |end| end + 3);
        } else if starts_with_ignore_case(rest, "<ref") {
            let tag_end = rest.find('>').map_or(rest.len(), |end| end + 1);
            if rest[..tag_end].ends_with("/>") {
                i += tag_end;
            } else {
                i += find_ignore_case(rest, "</ref>").map_or(rest.len(), |end| end + "</ref>".len());
            }
        } else if in_tag {
            out.push(' ');
            i += rest.find('>').map_or(rest.len(), |end| end + 1);
        } else if rest.starts_with("{{") {
            i += matching(rest, "{{", "}}").unwrap_or(rest.len());
        } else if rest.starts_with("[[") {
            let (inner, consumed) = match matching(rest, "[[", "]]") {
                Some(end) => (&rest[2..end - 2], end),
                None => (&rest[2..], rest.len()),
            };
            if !starts_with_ignore_case(inner, "file:") && !starts_with_ignore_case(inner, "image:") {
                let label = split_top_level(inner).pop().unwrap_or(inner);
                if depth < MAX_LINK_DEPTH {
                    strip_into(label, depth + 1, out);
                } else {
                    out.push_str(label);
                }
            }
            i += consumed;
        } else if rest.starts_with("'''") {
            i += 3;
        } else if rest.starts_with("''") {
            i += 2;
        } else if rest.starts_with("&nbsp;") {
            out.push(' ');
            i += "&nbsp;".len();
        } else {
            let ch = rest.chars().next().unwrap_or(' ');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
}

/// Byte offset of the first ASCII case-insensitive match of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// First number in a field value. Accepts thousands separators and a
/// trailing `million`, `billion` or `trillion`.
pub fn parse_number(value: &str) -> Option<f64> {
    let plain = strip_markup(value);
    let start = plain.find(|c: char| c.is_ascii_digit())?;
    let tail = &plain[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(tail.len());
    let digits: String = tail[..end]
        .trim_end_matches(['.', ','])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let base: f64 = digits.parse().ok()?;

    let suffix = tail[end..].trim_start().to_ascii_lowercase();
    let scale = if suffix.starts_with("trillion") {
        1e12
    } else if suffix.starts_with("billion") {
        1e9
    } else if suffix.starts_with("million") {
        1e6
    } else {
        1.0
    };
    Some(base * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPHIRIA: &str = r#"
'''Caphiria''' is a country.
{{Infobox country
| conventional_long_name = Imperial Republic of [[Caphiria|Caphiria]]
| common_name = Caphiria
| image_flag = Flag of Caphiria.svg
| capital = [[Venceia]]<ref name="census">Census office, 2031</ref>
| government_type = [[Unitary state|Unitary]] [[Presidential system|presidential]] republic
| population_estimate = {{increase}} 86,330,000
| GDP_PPP_per_capita = $45,200<ref name="imf"/>
| continent = '''Levantia'''
}}
Caphiria borders {{convert|12|km}} of coastline.
"#;

    #[test]
    fn extracts_country_record() {
        let record = parse_country(CAPHIRIA).unwrap();
        assert_eq!(record.name, "Caphiria");
        assert_eq!(record.capital.as_deref(), Some("Venceia"));
        assert_eq!(
            record.government_type.as_deref(),
            Some("Unitary presidential republic")
        );
        assert_eq!(record.population, Some(86_330_000));
        assert_eq!(record.gdp_per_capita, Some(45_200.0));
        assert_eq!(record.continent.as_deref(), Some("Levantia"));
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = parse_country("{{Infobox country\n| capital = Nowhere\n}}").unwrap_err();
        assert_eq!(err.to_string(), "infobox has no country name");
    }

    #[test]
    fn missing_or_unterminated_infobox_is_rejected() {
        assert!(parse_country("just prose").is_err());
        assert!(parse_country("{{Infobox country | name = X").is_err());
    }

    #[test]
    fn pipes_inside_links_and_templates_do_not_split_fields() {
        let text = "{{Infobox country|name=[[Urcea|Holy Kingdom]]|capital={{nowrap|A|B}} Kartika}}";
        let record = parse_country(text).unwrap();
        assert_eq!(record.name, "Holy Kingdom");
        assert_eq!(record.capital.as_deref(), Some("Kartika"));
    }

    #[test]
    fn falls_back_to_long_name() {
        let record = parse_country("{{infobox country\n|conventional_long_name=Republic of Oan\n}}").unwrap();
        assert_eq!(record.name, "Republic of Oan");
        assert_eq!(record.population, None);
    }

    #[test]
    fn strips_markup() {
        assert_eq!(strip_markup("''[[a]]'' and '''b'''"), "a and b");
        assert_eq!(strip_markup("x<br />y"), "x y");
        assert_eq!(strip_markup("v<!-- hidden -->w"), "vw");
        assert_eq!(strip_markup("[[File:Map.png|thumb]]Land"), "Land");
        assert_eq!(strip_markup("a&nbsp;b"), "a b");
        assert_eq!(strip_markup("a<REF>note</Ref>b"), "ab");
    }

    #[test]
    fn nested_links_keep_their_labels() {
        assert_eq!(strip_markup("[[a [[b|c]] d]]"), "a c d");
    }

    #[test]
    fn unterminated_links_do_not_recurse_without_bound() {
        let text = format!("{{{{Infobox country|name={}}}}}", "[[".repeat(20_000));
        let record = parse_country(&text).unwrap();
        assert!(record.name.starts_with("[["));

        let nested = format!("{}Oan{}", "[[".repeat(50), "]]".repeat(50));
        assert_eq!(strip_markup(&nested), format!("{}Oan{}", "[[".repeat(41), "]]".repeat(41)));
    }

    #[test]
    fn stray_angle_brackets_are_kept() {
        let text = "<".repeat(10_000);
        assert_eq!(strip_markup(&text), text);
        assert_eq!(strip_markup("a < b"), "a < b");
    }

    #[test]
    fn parses_numbers_with_separators_and_scale() {
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number("$65,000 (2030)"), Some(65_000.0));
        assert_eq!(parse_number("331.9 million").map(f64::round), Some(331_900_000.0));
        assert_eq!(parse_number("1.2 Billion").map(f64::round), Some(1_200_000_000.0));
        assert_eq!(parse_number("unknown"), None);
    }
}
