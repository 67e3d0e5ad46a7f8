//! Listen loop
//!
//! Reads one control byte at a time (waiting indefinitely) and acts on it
//! according to the node's role. A master returns once it has refused a
//! call or the peer hands the role back. A slave runs until `stop_listening`
//! is requested, the peer gives up the master role or the connection fails.

use super::{ListenAction, Node, Role};
use crate::error::{NodeSocketError, Result};
use crate::protocol::{encode_response_frame, ResponseCode};

impl Node {
    /// Service commands from the peer
    ///
    /// A stop requested through `stop_listening` is consumed when the loop
    /// returns, so the next call listens again.
    pub fn listen(&mut self) -> Result<()> {
        let result = self.listen_loop();
        self.control.reset();

        if let Err(e) = &result {
            if e.is_fatal() {
                tracing::debug!("Listen ended on an unframed stream, closing: {}", e);
                self.close();
            }
        }
        result
    }

    fn listen_loop(&mut self) -> Result<()> {
        if !self.state().is_verified() {
            return Err(NodeSocketError::NotPermitted(format!(
                "cannot listen on a {} connection",
                self.state()
            )));
        }

        while !self.control.is_stopped() {
            let (connection, _) = self.connection_parts()?;
            let byte = connection.read_control_byte()?;
            let action = self.arbiter.decide(byte);

            tracing::trace!("Control byte 0x{:02x} as {}: {:?}", byte, self.arbiter.role(), action);

            match action {
                ListenAction::Yield => {
                    self.arbiter.set_role(Role::Slave);
                    tracing::info!("Yielded master role to peer");
                }
                ListenAction::Retain => {
                    tracing::info!("Denied peer's master request");
                }
                ListenAction::EndCycle => {}
                ListenAction::RejectNotAllowed { drain } => {
                    let (connection, hooks) = self.connection_parts()?;
                    if drain {
                        connection.discard_call_frame(hooks)?;
                    }
                    connection.write_response_code(ResponseCode::NotAllowed)?;
                }
                ListenAction::Dispatch => self.dispatch_call()?,
                ListenAction::ClaimMaster => {
                    self.request_master()?;
                }
                ListenAction::Ignore => {}
                ListenAction::RejectInvalid => {
                    tracing::warn!("Invalid execution code 0x{:02x} from peer", byte);
                    let (connection, _) = self.connection_parts()?;
                    connection.write_response_code(ResponseCode::InvalidExecCode)?;
                }
            }

            if !action.continues() {
                break;
            }
        }

        Ok(())
    }

    fn dispatch_call(&mut self) -> Result<()> {
        let (connection, hooks) = self.connection_parts()?;
        let frame = connection.read_call_frame(hooks)?;

        tracing::debug!("Dispatching '{}' with {} argument(s)", frame.identifier, frame.args.len());
        let response = self.registry.dispatch(&frame, &self.control);

        let (connection, _) = self.connection_parts()?;
        connection.write_all(&encode_response_frame(&response))
    }
}
