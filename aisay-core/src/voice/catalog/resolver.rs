//! Maps a voice ID or free-text name to a canonical voice ID

use feruca::Collator;
use std::cmp::Ordering;
use uuid::Uuid;

use super::provider::{VoiceCatalog, VoiceRecord, PAGE_SIZE};
use crate::error::{Result, SayError};

/// Whether `reference` already has the shape of a voice ID (a hyphenated
/// 36-character UUID, any case)
pub fn is_voice_id(reference: &str) -> bool {
    reference.len() == 36 && Uuid::try_parse(reference).is_ok()
}

/// Pick the best match for `reference`: exact ID, then exact name, then
/// name containing the reference. Name comparisons ignore case.
pub fn match_voice<'a>(voices: &'a [VoiceRecord], reference: &str) -> Option<&'a VoiceRecord> {
    let needle = reference.to_lowercase();

    voices
        .iter()
        .find(|v| v.id == reference)
        .or_else(|| voices.iter().find(|v| v.name.to_lowercase() == needle))
        .or_else(|| voices.iter().find(|v| v.name.to_lowercase().contains(&needle)))
}

/// Unicode collation (CLDR root) on the display name, then ID
fn compare_by_name(collator: &mut Collator, a: &VoiceRecord, b: &VoiceRecord) -> Ordering {
    collator
        .collate(&a.name, &b.name)
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorted public voices, yielded as `(id, name)`
pub struct VoiceListing {
    voices: std::vec::IntoIter<VoiceRecord>,
}

impl Iterator for VoiceListing {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.voices.next().map(|v| (v.id, v.name))
    }
}

pub struct VoiceResolver<'a> {
    catalog: &'a dyn VoiceCatalog,
}

impl<'a> VoiceResolver<'a> {
    pub fn new(catalog: &'a dyn VoiceCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve a voice reference to a canonical ID. ID-shaped references are
    /// returned as-is without touching the catalog.
    pub async fn resolve(&self, reference: &str) -> Result<String> {
        if is_voice_id(reference) {
            tracing::debug!(voice = reference, "voice reference is already an id");
            return Ok(reference.to_string());
        }

        let voices = self.fetch_all().await?;
        let voice = match_voice(&voices, reference)
            .ok_or_else(|| SayError::VoiceNotFound(reference.to_string()))?;

        tracing::info!(
            reference,
            voice_id = %voice.id,
            voice_name = %voice.name,
            "resolved voice"
        );
        Ok(voice.id.clone())
    }

    /// Public voices as `(id, name)`, sorted by name with ID as tiebreak
    pub async fn list(&self) -> Result<VoiceListing> {
        let mut voices: Vec<VoiceRecord> = self
            .fetch_all()
            .await?
            .into_iter()
            .filter(|v| v.is_public)
            .collect();
        let mut collator = Collator::default();
        voices.sort_by(|a, b| compare_by_name(&mut collator, a, b));

        Ok(VoiceListing {
            voices: voices.into_iter(),
        })
    }

    /// Page through the whole catalog, one request in flight at a time
    pub async fn fetch_all(&self) -> Result<Vec<VoiceRecord>> {
        let mut voices = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .catalog
                .fetch_page(PAGE_SIZE, cursor.as_deref())
                .await?;

            let next_cursor = page.data.last().map(|v| v.id.clone());
            voices.extend(page.data);

            if !page.has_more {
                break;
            }
            match next_cursor {
                Some(id) => cursor = Some(id),
                None => {
                    tracing::warn!("catalog reported more pages after an empty page");
                    break;
                }
            }
        }

        tracing::debug!(total = voices.len(), "voice catalog loaded");
        Ok(voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str) -> VoiceRecord {
        VoiceRecord {
            id: id.to_string(),
            name: name.to_string(),
            is_public: true,
        }
    }

    #[test]
    fn test_is_voice_id() {
        assert!(is_voice_id("694f9389-aac1-45b6-b726-9d9369183238"));
        assert!(is_voice_id("694F9389-AAC1-45B6-B726-9D9369183238"));
        assert!(!is_voice_id("694f9389aac145b6b7269d9369183238"));
        assert!(!is_voice_id("{694f9389-aac1-45b6-b726-9d9369183238}"));
        assert!(!is_voice_id("694f9389-aac1-45b6-b726-9d936918323z"));
        assert!(!is_voice_id("Barbershop Man"));
        assert!(!is_voice_id(""));
    }

    #[test]
    fn test_match_priority() {
        let voices = vec![
            voice("a", "Barbershop Man"),
            voice("b", "Man"),
            voice("man", "Someone Else"),
        ];

        assert_eq!(match_voice(&voices, "man").unwrap().id, "man");
        assert_eq!(match_voice(&voices, "MAN").unwrap().id, "b");
        assert_eq!(match_voice(&voices, "barber").unwrap().id, "a");
        assert!(match_voice(&voices, "woman").is_none());
    }

    fn sorted_ids(mut voices: Vec<VoiceRecord>) -> Vec<String> {
        let mut collator = Collator::default();
        voices.sort_by(|a, b| compare_by_name(&mut collator, a, b));
        voices.into_iter().map(|v| v.id).collect()
    }

    #[test]
    fn test_compare_by_name_ties() {
        let ids = sorted_ids(vec![voice("2", "amy"), voice("3", "Amy"), voice("1", "Amy")]);
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_compare_by_name_accents() {
        let ids = sorted_ids(vec![
            voice("z", "Zoe"),
            voice("e", "Émile"),
            voice("a", "Adam"),
            voice("o", "Ørjan"),
            voice("b", "bella"),
        ]);
        assert_eq!(ids, vec!["a", "b", "e", "o", "z"]);
    }
}
