//! Fixed-capacity circular command history with `!!` / `!n` lookup.
//!
//! Entries live in physical slots addressed by a cursor that wraps around the
//! capacity. Users see *logical* indices instead: `0` is always the oldest
//! command still retained, no matter where it sits physically.

use log::debug;
use std::io::{self, Write};
use thiserror::Error;

/// One remembered command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub line: String,
    /// Pid of the child process the line spawned, for external commands only.
    pub spawned_pid: Option<u32>,
}

impl HistoryEntry {
    fn new(line: &str) -> Self {
        Self {
            line: line.to_owned(),
            spawned_pid: None,
        }
    }
}

/// Errors produced while looking up or updating history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The text after `!` is not `!` or a decimal index within capacity.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Command not in history")]
    NotFound,
    #[error("history slot {0} holds no entry")]
    StaleIndex(usize),
}

/// A parsed bang reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BangRef {
    /// `!!`
    Last,
    /// `!n`, a logical index.
    Index(usize),
}

impl BangRef {
    /// Parse `reference` (including its leading `!`) against a history of
    /// `capacity` slots.
    pub fn parse(reference: &str, capacity: usize) -> Result<Self, HistoryError> {
        let invalid = || HistoryError::InvalidReference(reference.to_owned());
        let body = reference.strip_prefix('!').ok_or_else(invalid)?;
        if body == "!" {
            return Ok(BangRef::Last);
        }
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        match body.parse::<usize>() {
            Ok(n) if n < capacity => Ok(BangRef::Index(n)),
            _ => Err(invalid()),
        }
    }
}

/// A resolved reference: where the entry lives and what it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    /// Physical slot, usable with [`HistoryStore::attach_pid`].
    pub index: usize,
    pub line: &'a str,
}

/// Circular buffer of the most recent command lines.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    slots: Vec<Option<HistoryEntry>>,
    /// Slot of the most recent entry; `None` until something is recorded.
    cursor: Option<usize>,
}

impl HistoryStore {
    /// Create an empty store. A zero capacity is bumped to one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }

    /// Store `line` as the newest entry and return its physical slot.
    ///
    /// Once the store is full this overwrites the oldest entry.
    pub fn record(&mut self, line: &str) -> usize {
        let slot = match self.cursor {
            None => 0,
            Some(cursor) => (cursor + 1) % self.capacity(),
        };
        if let Some(old) = self.slots[slot].replace(HistoryEntry::new(line)) {
            debug!("history slot {} overwritten, dropped {:?}", slot, old.line);
        }
        self.cursor = Some(slot);
        debug!("recorded {:?} in history slot {}", line, slot);
        slot
    }

    /// Remember which process the entry in physical slot `index` spawned.
    pub fn attach_pid(&mut self, index: usize, pid: u32) -> Result<(), HistoryError> {
        let entry = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(HistoryError::StaleIndex(index))?;
        entry.spawned_pid = Some(pid);
        Ok(())
    }

    /// Entry stored in physical slot `index`, if any.
    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Resolve a `!!` or `!n` reference to the entry it names.
    pub fn resolve_bang(&self, reference: &str) -> Result<Resolved<'_>, HistoryError> {
        let index = match BangRef::parse(reference, self.capacity())? {
            BangRef::Last => self.cursor.ok_or(HistoryError::NotFound)?,
            BangRef::Index(n) => self.physical_index(n),
        };
        let entry = self.entry(index).ok_or(HistoryError::NotFound)?;
        debug!("{} resolved to slot {}: {:?}", reference, index, entry.line);
        Ok(Resolved {
            index,
            line: &entry.line,
        })
    }

    /// Entries from oldest to newest, paired with their logical index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HistoryEntry)> + '_ {
        let start = self.oldest_slot();
        let capacity = self.capacity();
        (0..capacity)
            .filter_map(move |n| self.slots[(start + n) % capacity].as_ref())
            .enumerate()
    }

    /// Write every entry as `[index] line`, or `[index] (pid) line` when
    /// `show_pid` is set and the entry spawned a process.
    pub fn print(&self, out: &mut dyn Write, show_pid: bool) -> io::Result<()> {
        for (index, entry) in self.iter() {
            match entry.spawned_pid {
                Some(pid) if show_pid => writeln!(out, "[{}] ({}) {}", index, pid, entry.line)?,
                _ => writeln!(out, "[{}] {}", index, entry.line)?,
            }
        }
        Ok(())
    }

    /// Whether recording has come back around so the oldest entry now sits
    /// right after the cursor rather than at slot 0.
    fn has_wrapped(&self) -> bool {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.capacity() => self.slots[cursor + 1].is_some(),
            _ => false,
        }
    }

    fn oldest_slot(&self) -> usize {
        match self.cursor {
            Some(cursor) if self.has_wrapped() => cursor + 1,
            _ => 0,
        }
    }

    fn physical_index(&self, logical: usize) -> usize {
        (self.oldest_slot() + logical) % self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(capacity: usize, lines: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new(capacity);
        for line in lines {
            store.record(line);
        }
        store
    }

    fn printed(store: &HistoryStore, show_pid: bool) -> String {
        let mut out = Vec::new();
        store.print(&mut out, show_pid).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bang_reference_forms() {
        assert_eq!(BangRef::parse("!!", 15), Ok(BangRef::Last));
        assert_eq!(BangRef::parse("!0", 15), Ok(BangRef::Index(0)));
        assert_eq!(BangRef::parse("!14", 15), Ok(BangRef::Index(14)));
        for bad in ["!15", "!", "!x", "!3x", "!-1", "!!!", "!+2", "!99999999999999999999999"] {
            assert_eq!(
                BangRef::parse(bad, 15),
                Err(HistoryError::InvalidReference(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_last_on_empty_history_is_not_found() {
        let store = HistoryStore::new(15);
        assert_eq!(store.resolve_bang("!!"), Err(HistoryError::NotFound));
        assert_eq!(store.resolve_bang("!0"), Err(HistoryError::NotFound));
    }

    #[test]
    fn test_resolve_before_wrapping() {
        let store = store_with(15, &["pwd", "ls -l"]);
        assert_eq!(store.resolve_bang("!0").unwrap().line, "pwd");
        assert_eq!(store.resolve_bang("!1").unwrap().line, "ls -l");
        assert_eq!(store.resolve_bang("!!").unwrap().line, "ls -l");
        assert_eq!(store.resolve_bang("!2"), Err(HistoryError::NotFound));
    }

    #[test]
    fn test_oldest_entry_is_overwritten_when_full() {
        let lines: Vec<String> = (0..16).map(|i| format!("cmd{i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let store = store_with(15, &refs);

        assert_eq!(store.len(), 15);
        assert_eq!(store.resolve_bang("!0").unwrap().line, "cmd1");
        assert_eq!(store.resolve_bang("!14").unwrap().line, "cmd15");
        assert_eq!(store.resolve_bang("!!").unwrap().line, "cmd15");
        assert!(store.iter().all(|(_, entry)| entry.line != "cmd0"));
    }

    #[test]
    fn test_exactly_full_store_maps_directly() {
        let store = store_with(3, &["a", "b", "c"]);
        assert_eq!(store.resolve_bang("!0").unwrap().line, "a");
        assert_eq!(store.resolve_bang("!2").unwrap().line, "c");
    }

    #[test]
    fn test_logical_order_after_several_wraps() {
        let store = store_with(3, &["a", "b", "c", "d", "e", "f", "g"]);
        let lines: Vec<&str> = store.iter().map(|(_, e)| e.line.as_str()).collect();
        assert_eq!(lines, vec!["e", "f", "g"]);
        assert_eq!(store.resolve_bang("!0").unwrap().line, "e");
        assert_eq!(store.resolve_bang("!!").unwrap().line, "g");
    }

    #[test]
    fn test_print_lists_oldest_first() {
        let store = store_with(15, &["a", "b", "c"]);
        assert_eq!(printed(&store, false), "[0] a\n[1] b\n[2] c\n");
    }

    #[test]
    fn test_print_with_pids() {
        let mut store = HistoryStore::new(15);
        store.record("cd /tmp");
        let slot = store.record("ls");
        store.attach_pid(slot, 4242).unwrap();

        assert_eq!(printed(&store, true), "[0] cd /tmp\n[1] (4242) ls\n");
        assert_eq!(printed(&store, false), "[0] cd /tmp\n[1] ls\n");
    }

    #[test]
    fn test_overwriting_a_slot_resets_its_pid() {
        let mut store = HistoryStore::new(2);
        let slot = store.record("sleep 1");
        store.attach_pid(slot, 7).unwrap();
        store.record("b");
        let reused = store.record("c");

        assert_eq!(reused, slot);
        assert_eq!(store.entry(slot).unwrap().spawned_pid, None);
    }

    #[test]
    fn test_attach_pid_to_empty_slot_fails() {
        let mut store = HistoryStore::new(4);
        assert_eq!(store.attach_pid(2, 1), Err(HistoryError::StaleIndex(2)));
        assert_eq!(store.attach_pid(9, 1), Err(HistoryError::StaleIndex(9)));
    }
}
