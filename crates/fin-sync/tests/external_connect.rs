mod support;

use std::sync::{Arc, Mutex};

use fin_core::ProfileSlot;
use fin_sync::{ClientError, ConnectLauncher, FinanceClient};
use support::{CONNECT_URL, profile, scripted, signed_in, subject};

#[derive(Default)]
struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl ConnectLauncher for RecordingLauncher {
    fn launch(&self, url: &str) -> Result<(), String> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct BrokenLauncher;

impl ConnectLauncher for BrokenLauncher {
    fn launch(&self, _url: &str) -> Result<(), String> {
        Err("no browser available".into())
    }
}

#[tokio::test]
async fn connect_opens_url_and_invalidates_profile() {
    let (backend, mut ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);
    ctl.next_profile().await.resolve(Ok(profile("a")));
    client.load_profile().await.expect("profile");

    let launcher = RecordingLauncher::default();
    let url = client.begin_external_connect(&launcher).expect("connect");

    assert_eq!(url, CONNECT_URL);
    assert_eq!(*launcher.opened.lock().unwrap(), vec![CONNECT_URL.to_string()]);
    assert_eq!(client.profiles().peek(&subject("a")), ProfileSlot::Empty);
}

#[tokio::test]
async fn launcher_failure_is_reported() {
    let (backend, _ctl) = scripted();
    let client = FinanceClient::new(Arc::new(signed_in("a")), backend);

    let err = client
        .begin_external_connect(&BrokenLauncher)
        .expect_err("fails");
    assert!(matches!(err, ClientError::Connect(reason) if reason.contains("browser")));
}

#[tokio::test]
async fn connect_requires_identity() {
    let (backend, _ctl) = scripted();
    let client = FinanceClient::new(
        Arc::new(fin_auth::ChannelIdentityProvider::new()),
        backend,
    );
    assert!(matches!(
        client.begin_external_connect(&RecordingLauncher::default()),
        Err(ClientError::NotAuthenticated)
    ));
}
