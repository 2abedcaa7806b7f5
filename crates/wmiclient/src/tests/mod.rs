//! Crate-level integration and BDD tests.

use std::io::{self, Cursor};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use crate::codes::ErrorKind;
use crate::error::ClientError;
use crate::identity::TargetIdentity;
use crate::sink::NullSink;
use crate::transport::{SessionTransport, Worker, WorkerLauncher};
use crate::{ErrorPolicy, WmiClient};


/// Launches workers that replay a fixed transcript and discard requests.
struct CannedLauncher(&'static str);

impl WorkerLauncher for CannedLauncher {
    fn launch(&mut self) -> Result<Worker, ClientError> {
        Ok(Worker::new(
            Box::new(Cursor::new(self.0.as_bytes().to_vec())),
            Box::new(io::sink()),
        ))
    }

    fn describe(&self) -> String {
        "canned-agent".to_owned()
    }
}

fn client(transcript: &'static str) -> WmiClient<SessionTransport<CannedLauncher>> {
    let identity = TargetIdentity::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), "", "admin", "pw");
    let transport = SessionTransport::with_launcher(CannedLauncher(transcript), Arc::new(NullSink));
    WmiClient::with_transport(identity, transport)
}

#[test]
fn end_to_end_session_round_trips() {
    let mut client = client(concat!(
        "= START OUTPUT0\n",
        "4C4C4544-0042\n",
        "= END OUTPUT\n",
        "= ERROR 2 key not found\n",
        "= START OUTPUT\n",
        "Running\n",
        "= END OUTPUT\n",
    ));

    let (_, uuid) = client.query_uuid().expect("uuid");
    assert_eq!(uuid, "4C4C4544-0042");

    let missing = client
        .registry_get_key("SOFTWARE\\Vendor", "Version", ErrorPolicy::ReturnRaw)
        .expect("raw result");
    assert_eq!(missing.code(), 2);
    assert_eq!(missing.error(), &["2 key not found".to_owned()]);

    let status = client.service_query("Spooler").expect("status");
    assert_eq!(status.output(), &["Running".to_owned()]);
    assert_eq!(client.transport_mut().launch_count(), 1);
}

#[test]
fn stack_trace_is_classified_as_unknown() {
    let mut client = client("= START STACKTRACE\njava.lang.NullPointerException\n= END STACKTRACE\n");

    let error = client.process_status(17).expect_err("stack trace");

    assert_eq!(error.kind(), Some(ErrorKind::Unknown));
    assert_eq!(
        error.result().map(|result| result.error().to_vec()),
        Some(vec!["java.lang.NullPointerException".to_owned()])
    );
}
