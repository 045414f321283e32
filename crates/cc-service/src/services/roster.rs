//! In-process roster mirror.
//!
//! A read-cache of the provider's participant roster. The provider is the
//! source of truth: the mirror is seeded from a server-confirmed role,
//! presence events only ever update the cache, and moderation helpers return
//! intents addressed to the provider instead of mutating local state. Local
//! state changes when the corresponding provider event arrives, or when a
//! full snapshot replaces it via `reconcile`.

use std::collections::HashMap;

use crate::errors::CcError;
use crate::models::ParticipantRole;

/// One attendee as the provider reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub attendee_id: String,
    pub display_name: String,
    pub role: ParticipantRole,
    pub audio_muted: bool,
    pub video_enabled: bool,
}

impl RosterEntry {
    /// Placeholder entry for an attendee seen in an event before any roster
    /// snapshot mentioned them.
    fn unknown(attendee_id: &str) -> Self {
        Self {
            attendee_id: attendee_id.to_string(),
            display_name: String::new(),
            role: ParticipantRole::Attendee,
            audio_muted: false,
            video_enabled: false,
        }
    }
}

/// Presence callbacks delivered by the provider.
#[derive(Debug, Clone)]
pub enum PresenceEvent {
    Joined(RosterEntry),
    Left { attendee_id: String },
    AudioToggled { attendee_id: String, muted: bool },
    VideoToggled { attendee_id: String, enabled: bool },
    RoleChanged { attendee_id: String, role: ParticipantRole },
}

/// A moderation intent to send to the provider. The mirror never applies
/// these locally; it waits for the provider's event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    Mute { attendee_id: String },
    Promote { attendee_id: String },
    Remove { attendee_id: String },
}

#[derive(Debug)]
pub struct RosterMirror {
    local_attendee_id: String,
    entries: HashMap<String, RosterEntry>,
}

impl RosterMirror {
    /// Build a mirror for the local attendee with the role the server
    /// confirmed at join time. The role is never inferred locally.
    pub fn new(local_attendee_id: String, confirmed_role: ParticipantRole) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            local_attendee_id.clone(),
            RosterEntry {
                attendee_id: local_attendee_id.clone(),
                display_name: String::new(),
                role: confirmed_role,
                audio_muted: false,
                video_enabled: false,
            },
        );

        Self {
            local_attendee_id,
            entries,
        }
    }

    /// Apply a single presence event. Events about attendees the mirror has
    /// never seen insert a placeholder entry rather than being dropped.
    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Joined(entry) => {
                self.entries.insert(entry.attendee_id.clone(), entry);
            }
            PresenceEvent::Left { attendee_id } => {
                self.entries.remove(&attendee_id);
            }
            PresenceEvent::AudioToggled { attendee_id, muted } => {
                self.entries
                    .entry(attendee_id.clone())
                    .or_insert_with(|| RosterEntry::unknown(&attendee_id))
                    .audio_muted = muted;
            }
            PresenceEvent::VideoToggled {
                attendee_id,
                enabled,
            } => {
                self.entries
                    .entry(attendee_id.clone())
                    .or_insert_with(|| RosterEntry::unknown(&attendee_id))
                    .video_enabled = enabled;
            }
            PresenceEvent::RoleChanged { attendee_id, role } => {
                self.entries
                    .entry(attendee_id.clone())
                    .or_insert_with(|| RosterEntry::unknown(&attendee_id))
                    .role = role;
            }
        }
    }

    /// Replace the mirror with an authoritative snapshot from the provider.
    pub fn reconcile(&mut self, snapshot: Vec<RosterEntry>) {
        self.entries = snapshot
            .into_iter()
            .map(|entry| (entry.attendee_id.clone(), entry))
            .collect();
    }

    pub fn get(&self, attendee_id: &str) -> Option<&RosterEntry> {
        self.entries.get(attendee_id)
    }

    pub fn local(&self) -> Option<&RosterEntry> {
        self.entries.get(&self.local_attendee_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn local_is_host(&self) -> bool {
        self.local()
            .is_some_and(|entry| entry.role == ParticipantRole::Host)
    }

    fn moderation(&self, attendee_id: &str) -> Result<(), CcError> {
        if !self.local_is_host() {
            return Err(CcError::InvalidState(
                "Only the host can moderate participants".to_string(),
            ));
        }
        if !self.entries.contains_key(attendee_id) {
            return Err(CcError::NotFound(format!(
                "Attendee {attendee_id} is not in the roster"
            )));
        }
        Ok(())
    }

    /// Request that the provider mute an attendee.
    pub fn mute_request(&self, attendee_id: &str) -> Result<ModerationAction, CcError> {
        self.moderation(attendee_id)?;
        Ok(ModerationAction::Mute {
            attendee_id: attendee_id.to_string(),
        })
    }

    /// Request that the provider promote an attendee to host.
    pub fn promote_request(&self, attendee_id: &str) -> Result<ModerationAction, CcError> {
        self.moderation(attendee_id)?;
        Ok(ModerationAction::Promote {
            attendee_id: attendee_id.to_string(),
        })
    }

    /// Request that the provider remove an attendee from the session.
    pub fn remove_request(&self, attendee_id: &str) -> Result<ModerationAction, CcError> {
        self.moderation(attendee_id)?;
        Ok(ModerationAction::Remove {
            attendee_id: attendee_id.to_string(),
        })
    }
}
