//! Profile queue and activation tracking.
//!
//! One `ProfileTracker` lives for exactly one resolution. It owns the queue
//! of profiles still to be processed (with `None` standing for "no
//! profile"), the list of profiles already processed, the one-shot
//! activation flag, and the set of profiles currently considered active for
//! document acceptance.
//!
//! Invariants:
//! - The sentinel is queued first and therefore processed first.
//! - A profile is handed out by [`ProfileTracker::poll`] at most once.
//! - Activation happens once; later attempts leave the queue untouched.
//! - Once activation happens, still-queued default profiles are dropped.

pub mod expression;

pub use expression::Profiles;

use crate::error::Result;
use std::collections::VecDeque;

/// A queued profile; `None` is the "no profile" sentinel.
pub type Profile = Option<String>;

/// Per-resolution profile state machine.
#[derive(Debug, Default)]
pub struct ProfileTracker {
    queue: VecDeque<Profile>,
    processed: Vec<Profile>,
    activated: bool,
    default_profiles: Vec<String>,
    active: Vec<String>,
}

impl ProfileTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the queue.
    ///
    /// `ambient_active` are the profiles the environment reports as active,
    /// `activated` and `included` the ones named by the override keys.
    /// Defaults are queued only when nothing else was.
    pub fn initialize(
        &mut self,
        ambient_active: &[String],
        ambient_defaults: &[String],
        activated: &[String],
        included: &[String],
    ) {
        self.queue.push_back(None);

        let others: Vec<String> = ambient_active
            .iter()
            .filter(|p| !activated.contains(p) && !included.contains(p))
            .cloned()
            .collect();
        for profile in others.iter().chain(included) {
            self.enqueue(profile);
            self.mark_active(profile);
        }
        self.activate(activated);

        if self.queue.len() == 1 {
            self.default_profiles = ambient_defaults.to_vec();
            for profile in ambient_defaults {
                self.enqueue(profile);
            }
            tracing::debug!(profiles = ?self.default_profiles, "No active profiles, using defaults");
        }
    }

    /// Take the next profile that has not been processed yet.
    pub fn poll(&mut self) -> Option<Profile> {
        while let Some(profile) = self.queue.pop_front() {
            if !self.processed.contains(&profile) {
                return Some(profile);
            }
        }
        None
    }

    /// Record that a pass for `profile` finished.
    pub fn mark_processed(&mut self, profile: Profile) {
        if !self.processed.contains(&profile) {
            self.processed.push(profile);
        }
    }

    /// Queue profiles declared as active by a document or override.
    ///
    /// Returns `true` if this call performed the (single) activation.
    pub fn activate(&mut self, profiles: &[String]) -> bool {
        if profiles.is_empty() {
            return false;
        }
        if self.activated {
            tracing::debug!(
                profiles = ?profiles,
                "Profiles already activated, ignoring further activation"
            );
            return false;
        }
        for profile in profiles {
            self.enqueue(profile);
            self.mark_active(profile);
        }
        tracing::debug!(profiles = ?profiles, "Activated profiles");
        self.activated = true;
        self.remove_unprocessed_defaults();
        true
    }

    /// Splice included profiles ahead of every not-yet-processed entry.
    pub fn include(&mut self, profiles: &[String]) {
        if profiles.is_empty() {
            return;
        }
        let mut spliced: VecDeque<Profile> = VecDeque::new();
        for profile in profiles {
            let entry = Some(profile.clone());
            if !self.processed.contains(&entry) && !spliced.contains(&entry) {
                spliced.push_back(entry);
            }
            self.mark_active(profile);
        }
        let remaining: Vec<Profile> = std::mem::take(&mut self.queue)
            .into_iter()
            .filter(|p| !spliced_contains(&spliced, p))
            .collect();
        spliced.extend(remaining);
        self.queue = spliced;
        tracing::debug!(profiles = ?profiles, "Included profiles");
    }

    /// Whether a document restricted to `declared` is accepted right now.
    pub fn accepts(&self, declared: &[String]) -> Result<bool> {
        let profiles = Profiles::parse(declared)?;
        Ok(profiles.matches(&|name| self.is_active(name)))
    }

    fn is_active(&self, name: &str) -> bool {
        if self.active.is_empty() {
            self.default_profiles.iter().any(|p| p == name)
        } else {
            self.active.iter().any(|p| p == name)
        }
    }

    /// Profiles already processed, in processing order.
    pub fn processed(&self) -> &[Profile] {
        &self.processed
    }

    /// Named profiles processed so far, sentinel excluded.
    pub fn processed_names(&self) -> impl Iterator<Item = &str> {
        self.processed.iter().filter_map(|p| p.as_deref())
    }

    /// Profiles considered active for acceptance checks.
    pub fn active_profiles(&self) -> &[String] {
        &self.active
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Snapshot of the queue, front first.
    pub fn queued(&self) -> Vec<Profile> {
        self.queue.iter().cloned().collect()
    }

    fn enqueue(&mut self, profile: &str) {
        let entry = Some(profile.to_string());
        if !self.queue.contains(&entry) && !self.processed.contains(&entry) {
            self.queue.push_back(entry);
        }
    }

    fn mark_active(&mut self, profile: &str) {
        if !self.active.iter().any(|p| p == profile) {
            self.active.push(profile.to_string());
        }
    }

    fn remove_unprocessed_defaults(&mut self) {
        let defaults = &self.default_profiles;
        let activated: &[String] = &self.active;
        self.queue.retain(|p| match p {
            Some(name) => !defaults.contains(name) || activated.contains(name),
            None => true,
        });
    }
}

fn spliced_contains(spliced: &VecDeque<Profile>, profile: &Profile) -> bool {
    profile.is_some() && spliced.contains(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn drain(tracker: &mut ProfileTracker) -> Vec<Profile> {
        let mut order = Vec::new();
        while let Some(profile) = tracker.poll() {
            tracker.mark_processed(profile.clone());
            order.push(profile);
        }
        order
    }

    #[test]
    fn test_defaults_when_nothing_active() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&[], &names(&["default"]), &[], &[]);
        assert_eq!(tracker.queued(), vec![None, Some("default".to_string())]);
        assert!(tracker.accepts(&names(&["default"])).unwrap());
        assert!(!tracker.accepts(&names(&["dev"])).unwrap());
    }

    #[test]
    fn test_initialize_order() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(
            &names(&["ambient", "dev"]),
            &names(&["default"]),
            &names(&["dev"]),
            &names(&["extra"]),
        );
        assert_eq!(
            tracker.queued(),
            vec![
                None,
                Some("ambient".to_string()),
                Some("extra".to_string()),
                Some("dev".to_string()),
            ]
        );
        assert!(tracker.is_activated());
    }

    #[test]
    fn test_activation_is_one_shot() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&[], &names(&["default"]), &[], &[]);
        assert!(tracker.activate(&names(&["dev"])));
        let before = tracker.queued();
        assert!(!tracker.activate(&names(&["prod"])));
        assert!(!tracker.activate(&names(&["dev"])));
        assert_eq!(tracker.queued(), before);
    }

    #[test]
    fn test_activation_evicts_unprocessed_defaults() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&[], &names(&["default"]), &[], &[]);
        tracker.activate(&names(&["dev"]));
        assert_eq!(tracker.queued(), vec![None, Some("dev".to_string())]);
        assert!(!tracker.accepts(&names(&["default"])).unwrap());
        assert!(tracker.accepts(&names(&["dev"])).unwrap());
    }

    #[test]
    fn test_include_goes_ahead_of_unprocessed() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&names(&["a", "b"]), &[], &[], &[]);
        let first = tracker.poll().unwrap();
        tracker.mark_processed(first);
        tracker.include(&names(&["extra"]));
        assert_eq!(
            tracker.queued(),
            vec![
                Some("extra".to_string()),
                Some("a".to_string()),
                Some("b".to_string())
            ]
        );
    }

    #[test]
    fn test_include_skips_processed() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&names(&["a"]), &[], &[], &[]);
        let order = drain(&mut tracker);
        assert_eq!(order, vec![None, Some("a".to_string())]);
        tracker.include(&names(&["a", "b"]));
        assert_eq!(tracker.queued(), vec![Some("b".to_string())]);
    }

    #[test]
    fn test_include_moves_queued_profile_forward() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&names(&["a", "b"]), &[], &[], &[]);
        tracker.include(&names(&["b"]));
        assert_eq!(
            tracker.queued(),
            vec![Some("b".to_string()), None, Some("a".to_string())]
        );
    }

    #[test]
    fn test_each_profile_polled_once() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&names(&["a"]), &[], &[], &[]);
        let _ = tracker.poll();
        tracker.mark_processed(None);
        tracker.include(&names(&["a"]));
        tracker.include(&names(&["a"]));
        let order = drain(&mut tracker);
        assert_eq!(order, vec![Some("a".to_string())]);
    }

    #[test]
    fn test_processed_names_excludes_sentinel() {
        let mut tracker = ProfileTracker::new();
        tracker.initialize(&names(&["a"]), &[], &[], &[]);
        drain(&mut tracker);
        let processed: Vec<&str> = tracker.processed_names().collect();
        assert_eq!(processed, vec!["a"]);
        assert_eq!(tracker.processed().len(), 2);
    }
}
