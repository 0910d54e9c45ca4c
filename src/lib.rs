// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate fnv;
extern crate rand;
extern crate serde;
extern crate serde_json;

use std::collections::HashMap;
use std::fmt;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

pub mod game;
pub mod geometry;
pub mod map;
mod schema;
pub mod unit;

pub use game::Match;
pub use geometry::{Direction, Offset, Vector};
pub use map::{Map, Tile};
pub use schema::{
    Command, CommandBatch, CommandKind, Extra, TileUpdate, TurnMessage, UnitID, UnitUpdate,
};
pub use unit::{Unit, UnitKind};

/// Fancy rust magic to define all of the error types we'll need
mod errors {
    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            Serial(::serde_json::Error);
        }
        errors {
            UnknownUnitType(t: String) {
                description("no such unit variant")
                display("no such unit variant: {}", t)
            }
            MissingUnitType(id: crate::schema::UnitID) {
                description("unit without a type")
                display("unit {} first reported without a type", id)
            }
            NoMoreMessages {
                description("no more messages")
                display("connection closed by peer")
            }
        }
    }
}
pub use errors::*;

type FastHashMap<K, V> = HashMap<K, V, std::hash::BuildHasherDefault<fnv::FnvHasher>>;

pub type Incoming<R> = StreamDeserializer<'static, IoRead<R>, TurnMessage>;

pub fn read_message<R: Read>(incoming: &mut Incoming<R>) -> Result<TurnMessage> {
    let next = incoming.next();
    if let Some(result) = next {
        Ok(result?)
    } else {
        bail!(ErrorKind::NoMoreMessages)
    }
}

pub fn write_message<W: Write>(batch: &CommandBatch, outgoing: &mut W) -> Result<()> {
    let value = serde_json::to_string(batch)?;
    outgoing.write_all(value.as_bytes())?;
    outgoing.write_all(b"\n")?;
    outgoing.flush()?;

    Ok(())
}

/// Counters for one connection.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Decision passes, one response each.
    pub passes: u64,
    /// Turn messages consumed.
    pub messages: u64,
    /// Passes that had to merge more than one message.
    pub coalesced_passes: u64,
    /// Messages merged into a pass on top of the first one.
    pub missed_turns: u64,
}

impl SessionStats {
    fn record(&mut self, batch_len: usize) {
        let batch_len = batch_len as u64;
        self.passes += 1;
        self.messages += batch_len;
        if batch_len > 1 {
            self.coalesced_passes += 1;
            self.missed_turns += batch_len - 1;
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} turns answered from {} messages, {} missed",
            self.passes, self.messages, self.missed_turns
        )
    }
}

/// Reads turn messages off the wire and queues them in arrival order.
///
/// Returns `Ok` at end of stream or once the decider has gone away; a
/// message that does not parse ends the loop with the parse error. Either
/// way the sender is dropped, which lets the decider finish what is queued.
pub fn listen<R: Read>(reader: R, queue: Sender<TurnMessage>) -> Result<()> {
    let mut incoming: Incoming<R> = StreamDeserializer::new(IoRead::new(reader));
    loop {
        let message = match read_message(&mut incoming) {
            Ok(message) => message,
            Err(Error(ErrorKind::NoMoreMessages, _)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if queue.send(message).is_err() {
            return Ok(());
        }
    }
}

/// Answers queued turns until the listener is gone and the queue is empty.
///
/// Each pass blocks for one message, then takes whatever else is already
/// waiting. A backlog means we fell behind the server; the whole run is
/// decided at once and answered with a single response.
pub fn decide<W: Write>(
    game: &mut Match,
    queue: &Receiver<TurnMessage>,
    outgoing: &mut W,
    stats: &mut SessionStats,
) -> Result<()> {
    while let Ok(first) = queue.recv() {
        let mut batch = vec![first];
        batch.extend(queue.try_iter());
        if batch.len() > 1 {
            warn!(
                "missed {} turn(s), deciding on {} messages at once",
                batch.len() - 1,
                batch.len()
            );
        }
        stats.record(batch.len());

        let response = game.process_updates(&batch);
        write_message(&response, outgoing)?;
    }
    Ok(())
}

/// Drives one connection: a listener thread feeding a queue, and the
/// decision loop on the calling thread. Closes the socket on the way out.
pub fn run_session(stream: TcpStream) -> Result<SessionStats> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut outgoing = BufWriter::new(stream.try_clone()?);
    let (sender, queue) = mpsc::channel();

    let listener = thread::Builder::new()
        .name("listener".into())
        .spawn(move || listen(reader, sender))?;

    let mut game = Match::new();
    let mut stats = SessionStats::default();
    let decided = decide(&mut game, &queue, &mut outgoing, &mut stats);

    // wakes the listener if the decider stopped first
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        debug!("shutdown: {}", e);
    }
    match listener.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("dropping connection: {}", e),
        Err(_) => error!("listener thread panicked"),
    }

    decided.map(|()| stats)
}

/// Accepts connections forever, one session thread per connection.
pub fn serve(listener: TcpListener) -> Result<()> {
    info!("waiting for connections on {}", listener.local_addr()?);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                error!("accept failed: {}", e);
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".into());
        info!("{}: connected", peer);

        let spawned = thread::Builder::new()
            .name(format!("session {}", peer))
            .spawn(move || match run_session(stream) {
                Ok(stats) => info!("{}: closed, {}", peer, stats),
                Err(e) => error!("{}: session failed: {}", peer, e),
            });
        if let Err(e) = spawned {
            error!("could not start session: {}", e);
        }
    }
    Ok(())
}
