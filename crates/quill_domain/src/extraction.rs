//! Marker-delimited extraction of typed fields from free-form model output.
//!
//! A [`SectionSchema`] declares an ordered list of `(marker, field)` pairs.
//! Markers are located left to right; each located marker owns the text up
//! to the next located marker, trimmed. Extraction never fails: anything the
//! model forgot to emit is simply absent from the result.

use std::hash::Hash;

use indexmap::IndexMap;

/// What to do with unmarked text when the primary (first) marker is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fallback {
    /// Leave the primary field absent.
    #[default]
    Omit,
    /// Assign the text before the first located marker, or the whole text
    /// when no marker is found, to the primary field.
    LeadingText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<F> {
    pub marker: &'static str,
    pub field: F,
}

impl<F> Section<F> {
    pub const fn new(marker: &'static str, field: F) -> Self {
        Self { marker, field }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSchema<F: 'static> {
    sections: &'static [Section<F>],
    fallback: Fallback,
}

impl<F: Copy + Eq + Hash> SectionSchema<F> {
    pub const fn new(sections: &'static [Section<F>]) -> Self {
        Self { sections, fallback: Fallback::Omit }
    }

    pub const fn with_fallback(self, fallback: Fallback) -> Self {
        Self { sections: self.sections, fallback }
    }

    pub fn extract(&self, text: &str) -> Extracted<F> {
        // (field, marker start, content start) for every marker found in order
        let mut located: Vec<(F, usize, usize)> = Vec::with_capacity(self.sections.len());
        let mut cursor = 0;
        for section in self.sections {
            if let Some(offset) = text[cursor..].find(section.marker) {
                let start = cursor + offset;
                cursor = start + section.marker.len();
                located.push((section.field, start, cursor));
            }
        }

        let mut fields = IndexMap::with_capacity(located.len() + 1);

        if let (Fallback::LeadingText, Some(primary)) = (self.fallback, self.sections.first()) {
            let primary_found = located.iter().any(|(field, ..)| *field == primary.field);
            if !primary_found {
                let end = located.first().map_or(text.len(), |(_, start, _)| *start);
                let leading = text[..end].trim();
                if !leading.is_empty() {
                    fields.insert(primary.field, leading.to_string());
                }
            }
        }

        for (index, (field, _, content_start)) in located.iter().enumerate() {
            let end = located
                .get(index + 1)
                .map_or(text.len(), |(_, next_start, _)| *next_start);
            fields.insert(*field, text[*content_start..end].trim().to_string());
        }

        Extracted { fields }
    }
}

/// Fields extracted by a [`SectionSchema`], in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<F: Eq + Hash> {
    fields: IndexMap<F, String>,
}

impl<F: Copy + Eq + Hash> Extracted<F> {
    pub fn get(&self, field: F) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// The field's text, or an empty string when it was not found.
    pub fn text(&self, field: F) -> &str {
        self.get(field).unwrap_or_default()
    }

    pub fn contains(&self, field: F) -> bool {
        self.fields.contains_key(&field)
    }

    /// First line of the field, if the field was found and is non-empty.
    pub fn first_line(&self, field: F) -> Option<&str> {
        self.get(field).and_then(|text| text.lines().next())
    }

    /// Interprets the field as a bullet list. Bullet markers are stripped and
    /// blank or `none` entries are dropped.
    pub fn list(&self, field: F) -> Vec<String> {
        self.get(field)
            .map(|text| {
                text.lines()
                    .map(strip_bullet)
                    .filter(|item| !item.is_empty() && !item.eq_ignore_ascii_case("none"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<F, String> {
        self.fields
    }
}

fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .trim_start_matches(['*', '•'])
        .trim()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Field {
        Notes,
        Sources,
        Gaps,
    }

    const SECTIONS: &[Section<Field>] = &[
        Section::new("NOTES:", Field::Notes),
        Section::new("SOURCES:", Field::Sources),
        Section::new("GAPS:", Field::Gaps),
    ];

    const STRICT: SectionSchema<Field> = SectionSchema::new(SECTIONS);
    const LENIENT: SectionSchema<Field> = SectionSchema::new(SECTIONS).with_fallback(Fallback::LeadingText);

    #[test]
    fn test_all_markers_yield_trimmed_fields() {
        let fixture = "NOTES:\n  revenue up [Source: q4.md]  \n\nSOURCES:\n- q4.md\n\nGAPS:\n- none\n";

        let actual = STRICT.extract(fixture);

        assert_eq!(actual.len(), 3);
        assert_eq!(actual.text(Field::Notes), "revenue up [Source: q4.md]");
        assert_eq!(actual.text(Field::Sources), "- q4.md");
        assert_eq!(actual.text(Field::Gaps), "- none");
    }

    #[test]
    fn test_only_present_markers_produce_fields() {
        let fixture = "NOTES: a\nGAPS: b";

        let actual = STRICT.extract(fixture);

        assert_eq!(actual.text(Field::Notes), "a");
        assert_eq!(actual.get(Field::Sources), None);
        assert_eq!(actual.text(Field::Gaps), "b");
    }

    #[test]
    fn test_missing_primary_uses_leading_text() {
        let fixture = "Some notes without a header\nSOURCES:\n- a.md";

        let actual = LENIENT.extract(fixture);

        let expected = vec![
            (Field::Notes, "Some notes without a header".to_string()),
            (Field::Sources, "- a.md".to_string()),
        ];
        assert_eq!(actual.into_inner().into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_no_markers_uses_whole_text() {
        let fixture = "  just prose  ";

        let actual = LENIENT.extract(fixture);

        assert_eq!(actual.text(Field::Notes), "just prose");
        assert_eq!(actual.len(), 1);
    }

    #[test]
    fn test_missing_primary_omitted_without_fallback() {
        let fixture = "prose\nSOURCES:\n- a.md";

        let actual = STRICT.extract(fixture);

        assert!(!actual.contains(Field::Notes));
        assert_eq!(actual.list(Field::Sources), vec!["a.md".to_string()]);
    }

    #[test]
    fn test_empty_text_extracts_nothing() {
        assert!(LENIENT.extract("").is_empty());
        assert!(STRICT.extract("   ").is_empty());
    }

    #[test]
    fn test_markers_are_located_in_declared_order() {
        // A later marker appearing first does not terminate an earlier section
        let fixture = "GAPS: early\nNOTES: n\nSOURCES: s";

        let actual = STRICT.extract(fixture);

        assert_eq!(actual.text(Field::Notes), "n");
        assert_eq!(actual.text(Field::Sources), "s");
        assert_eq!(actual.get(Field::Gaps), None);
    }

    #[test]
    fn test_list_strips_bullets_and_drops_none() {
        let fixture = "SOURCES:\n- a.md\n\n* b.md\n• c.md\nNone\n  -- d.md\n";

        let actual = STRICT.extract(fixture).list(Field::Sources);

        let expected = vec!["a.md", "b.md", "c.md", "d.md"];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_first_line() {
        let fixture = "NOTES:  PASS\nmore detail";

        let actual = STRICT.extract(fixture);

        assert_eq!(actual.first_line(Field::Notes), Some("PASS"));
        assert_eq!(actual.first_line(Field::Gaps), None);
    }
}
