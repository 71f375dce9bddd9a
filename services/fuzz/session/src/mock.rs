//! Scripted in-memory endpoints for session tests.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fuzz_wire::SendDescriptor;

use crate::address::AddressFamily;
use crate::endpoint::{Connector, Endpoint, Role};

/// Open step that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create,
    Broadcast,
    ReuseAddress,
    Timeout,
    SendBufferSize,
    DefaultDescriptor,
    Bind,
    Listen,
    Accept,
}

/// Everything an endpoint was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Create { id: usize, family: AddressFamily, role: Role },
    Broadcast { id: usize },
    ReuseAddress { id: usize },
    Timeout { id: usize, timeout: Duration },
    DefaultDescriptor { id: usize, descriptor: SendDescriptor },
    Bind { id: usize, addr: SocketAddr },
    Listen { id: usize },
    Accept { id: usize, peer: usize },
    SendTo { id: usize, data: Vec<u8>, dest: Option<SocketAddr> },
    SendWithDescriptor {
        id: usize,
        data: Vec<u8>,
        descriptor: SendDescriptor,
        dest: Option<SocketAddr>,
    },
    Recv { id: usize },
    Close { id: usize },
}

#[derive(Debug)]
pub struct MockState {
    pub events: Vec<Event>,
    pub send_buffer: usize,
    pub fail_step: Option<Step>,
    pub fail_sends: usize,
    pub inbound: VecDeque<io::Result<Vec<u8>>>,
    pub live: usize,
    next_id: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            send_buffer: 212992,
            fail_step: None,
            fail_sends: 0,
            inbound: VecDeque::new(),
            live: 0,
            next_id: 0,
        }
    }
}

impl MockState {
    fn check(&self, step: Step) -> io::Result<()> {
        if self.fail_step == Some(step) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("injected {:?} failure", step)));
        }
        Ok(())
    }

    fn new_endpoint(&mut self, shared: &Arc<Mutex<MockState>>) -> MockEndpoint {
        let id = self.next_id;
        self.next_id += 1;
        self.live += 1;
        MockEndpoint {
            id,
            state: Arc::clone(shared),
        }
    }
}

/// Connector handing out [`MockEndpoint`]s that share one script
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn sends(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::SendTo { .. } | Event::SendWithDescriptor { .. }))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl Connector for MockConnector {
    type Endpoint = MockEndpoint;

    fn create(&self, family: AddressFamily, role: Role) -> io::Result<MockEndpoint> {
        let mut state = self.state();
        state.check(Step::Create)?;
        let endpoint = state.new_endpoint(&self.state);
        state.events.push(Event::Create {
            id: endpoint.id,
            family,
            role,
        });
        Ok(endpoint)
    }
}

#[derive(Debug)]
pub struct MockEndpoint {
    id: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockEndpoint {
    fn step(&self, step: Step, event: Event) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(step)?;
        state.events.push(event);
        Ok(())
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live -= 1;
        }
    }
}

impl Endpoint for MockEndpoint {
    fn set_broadcast(&self, _enabled: bool) -> io::Result<()> {
        self.step(Step::Broadcast, Event::Broadcast { id: self.id })
    }

    fn set_reuse_address(&self, _enabled: bool) -> io::Result<()> {
        self.step(Step::ReuseAddress, Event::ReuseAddress { id: self.id })
    }

    fn set_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.step(Step::Timeout, Event::Timeout { id: self.id, timeout })
    }

    fn send_buffer_size(&self) -> io::Result<usize> {
        let state = self.state.lock().unwrap();
        state.check(Step::SendBufferSize)?;
        Ok(state.send_buffer)
    }

    fn set_default_descriptor(&self, descriptor: &SendDescriptor) -> io::Result<()> {
        self.step(
            Step::DefaultDescriptor,
            Event::DefaultDescriptor {
                id: self.id,
                descriptor: *descriptor,
            },
        )
    }

    fn bind(&self, addr: SocketAddr) -> io::Result<()> {
        self.step(Step::Bind, Event::Bind { id: self.id, addr })
    }

    fn listen(&self, _backlog: i32) -> io::Result<()> {
        self.step(Step::Listen, Event::Listen { id: self.id })
    }

    fn accept(&self) -> io::Result<Self> {
        let mut state = self.state.lock().unwrap();
        state.check(Step::Accept)?;
        let peer = state.new_endpoint(&self.state);
        state.events.push(Event::Accept {
            id: self.id,
            peer: peer.id,
        });
        Ok(peer)
    }

    fn send_to(&self, data: &[u8], dest: Option<SocketAddr>) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "association lost"));
        }
        state.events.push(Event::SendTo {
            id: self.id,
            data: data.to_vec(),
            dest,
        });
        Ok(data.len())
    }

    fn send_with_descriptor(
        &self,
        data: &[u8],
        descriptor: &SendDescriptor,
        dest: Option<SocketAddr>,
    ) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "association lost"));
        }
        state.events.push(Event::SendWithDescriptor {
            id: self.id,
            data: data.to_vec(),
            descriptor: *descriptor,
            dest,
        });
        Ok(data.len())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Recv { id: self.id });
        match state.inbound.pop_front() {
            Some(Ok(message)) => {
                let n = message.len().min(buf.len());
                buf[..n].copy_from_slice(&message[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out")),
        }
    }

    fn close(self) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Close { id: self.id });
    }
}
