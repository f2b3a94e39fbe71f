//! `Broadcaster`: bookkeeping for the UDP name-resolution conversation
//! that precedes every circuit.
//!
//! Unlike `VirtualCircuit`, a `Broadcaster` has no per-peer state
//! machine — `SearchRequest`/`SearchResponse` are, by design, fired at
//! a whole subnet and the caller decides which responses matter.
//! This object only tracks which searches are still unanswered and
//! hands out `cid`s, so a later `SearchResponse` can be matched back
//! to the name that produced it.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;

use crate::command::{Command, SearchReplyPolicy};
use crate::error::CaError;
use crate::framer;
use crate::ids::IdGenerator;

/// Outcome of asking the broadcaster to parse the next command out of
/// a datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    Command(Command),
    NeedData(usize),
}

pub struct Broadcaster {
    unanswered_searches: HashMap<u32, String>,
    cid_ids: IdGenerator,
    pending: VecDeque<Command>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            unanswered_searches: HashMap::new(),
            cid_ids: IdGenerator::new("cid"),
            pending: VecDeque::new(),
        }
    }

    /// Build `SearchRequest`s for `names`, registering a fresh `cid`
    /// for each and remembering it as unanswered. Returns the
    /// cid-per-name map alongside the encoded datagram payload.
    pub fn search<S: AsRef<str>>(
        &mut self,
        names: &[S],
        version: u16,
        reply: SearchReplyPolicy,
    ) -> Result<(HashMap<String, u32>, Bytes), CaError> {
        let mut assigned = HashMap::new();
        let mut payload = Vec::new();
        for name in names {
            let name = name.as_ref().to_string();
            let searches = &self.unanswered_searches;
            let cid = self.cid_ids.next_id(|id| searches.contains_key(&id))?;
            self.unanswered_searches.insert(cid, name.clone());
            let cmd = Command::SearchRequest { name: name.clone(), cid, version, reply };
            payload.extend(cmd.to_bytes());
            assigned.insert(name, cid);
        }
        Ok((assigned, Bytes::from(payload)))
    }

    /// Look up (and forget) the PV name a `SearchResponse`'s `cid`
    /// corresponds to.
    pub fn resolve(&mut self, cid: u32) -> Option<String> {
        self.unanswered_searches.remove(&cid)
    }

    /// True if `cid` still has an outstanding, unanswered search.
    pub fn is_pending(&self, cid: u32) -> bool {
        self.unanswered_searches.contains_key(&cid)
    }

    /// Feed one received UDP datagram. Every command it holds is
    /// parsed eagerly (a datagram is atomic) and queued for retrieval
    /// via `next_command`. `SearchResponse`/`NotFoundResponse` clear
    /// the matching entry from `unanswered_searches`.
    pub fn feed(&mut self, datagram: &[u8], from_server: bool) -> Result<(), CaError> {
        let commands = framer::parse_datagram(datagram, from_server)?;
        for cmd in commands {
            if let Command::SearchResponse { cid, .. } | Command::NotFoundResponse { cid, .. } = &cmd {
                self.unanswered_searches.remove(cid);
            }
            self.pending.push_back(cmd);
        }
        Ok(())
    }

    /// Pop the next queued command from a prior `feed` call, if any,
    /// in the order datagrams (and the commands within them) arrived.
    pub fn next_command(&mut self) -> Next {
        match self.pending.pop_front() {
            Some(cmd) => Next::Command(cmd),
            None => Next::NeedData(0),
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_assigns_distinct_cids() {
        let mut b = Broadcaster::new();
        let (assigned, payload) = b
            .search(&["simple:A", "simple:B"], 13, SearchReplyPolicy::ReplyRequired)
            .unwrap();
        assert_eq!(assigned.len(), 2);
        assert_ne!(assigned["simple:A"], assigned["simple:B"]);
        assert!(!payload.is_empty());
        assert!(b.is_pending(assigned["simple:A"]));
    }

    #[test]
    fn feed_clears_answered_search() {
        let mut b = Broadcaster::new();
        let (assigned, _) = b.search(&["simple:A"], 13, SearchReplyPolicy::ReplyRequired).unwrap();
        let cid = assigned["simple:A"];
        assert!(b.is_pending(cid));

        let response = Command::SearchResponse { port: 5064, cid, version: 13 };
        b.feed(&response.to_bytes(), true).unwrap();
        assert!(!b.is_pending(cid));

        match b.next_command() {
            Next::Command(cmd) => assert_eq!(cmd, response),
            Next::NeedData(_) => panic!("expected the queued response"),
        }
    }

    #[test]
    fn not_found_also_clears_the_search() {
        let mut b = Broadcaster::new();
        let (assigned, _) = b.search(&["simple:A"], 13, SearchReplyPolicy::ReplyRequired).unwrap();
        let cid = assigned["simple:A"];
        b.feed(&Command::NotFoundResponse { version: 13, cid }.to_bytes(), true)
            .unwrap();
        assert!(!b.is_pending(cid));
    }
}
