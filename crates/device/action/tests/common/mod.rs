//! Shared fixtures: an "open app" action and an in-memory device api
#![allow(dead_code, unreachable_pub)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use nexum_apdu_core::prelude::*;
use nexum_apdu_framing::SessionError;
use nexum_device_action::prelude::*;
use parking_lot::Mutex;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Name and version of the running application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppAndVersion {
    pub name: String,
    pub version: String,
}

/// Query the running application
#[derive(Debug, Clone, Copy)]
pub struct GetAppAndVersion;

impl Command for GetAppAndVersion {
    type Response = AppAndVersion;
    type Error = Error;

    fn apdu(&self) -> Apdu {
        Apdu::new(0xB0, 0x01, 0x00, 0x00)
    }

    fn parse_response(&self, response: ApduResponse) -> Result<AppAndVersion, Error> {
        let data = response.into_result()?;
        let mut parser = ByteParser::new(&data);
        if parser.read_u8() != Some(0x01) {
            return Err(Error::parse("Unsupported format"));
        }
        let name = parser.read_lv().ok_or(Error::parse("Missing app name"))?;
        let version = parser.read_lv().ok_or(Error::parse("Missing version"))?;
        Ok(AppAndVersion {
            name: ByteParser::encode_ascii(name),
            version: ByteParser::encode_ascii(version),
        })
    }
}

/// Response to [`GetAppAndVersion`]
pub fn app_and_version(name: &str, version: &str) -> ApduResponse {
    let mut payload = ByteBuilder::new(255);
    payload
        .add_u8(0x01)
        .encode_lv_ascii(name)
        .encode_lv_ascii(version);
    ApduResponse::success(payload.build())
}

/// Device api answering from a script
///
/// Once the script runs out, commands never complete.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<ApduResponse, SessionError>>>,
    sent: Mutex<Vec<Apdu>>,
}

impl ScriptedApi {
    pub fn new(
        responses: impl IntoIterator<Item = Result<ApduResponse, SessionError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<Apdu> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl InternalApi for ScriptedApi {
    async fn send_command(&self, apdu: Apdu) -> Result<ApduResponse, SessionError> {
        self.sent.lock().push(apdu);
        let next = self.responses.lock().pop_front();
        match next {
            Some(response) => response,
            None => futures::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAppError {
    Refused,
    Locked,
    Exchange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAppState {
    FetchingCurrentApp,
    OpeningApp,
}

#[derive(Debug)]
pub enum OpenAppEvent {
    CurrentApp(Result<AppAndVersion, CommandError<Error>>),
    Opened(Result<ApduResponse, SessionError>),
    Malformed,
}

/// Opens an application unless it is already running
#[derive(Debug)]
pub struct OpenAppMachine {
    api: Arc<dyn InternalApi>,
    stops: Arc<AtomicUsize>,
}

impl OpenAppMachine {
    fn fetch_current_app(&self) -> BoxFuture<'static, OpenAppEvent> {
        let api = Arc::clone(&self.api);
        async move {
            let current = api.send_typed(&GetAppAndVersion).await;
            OpenAppEvent::CurrentApp(current)
        }
        .boxed()
    }

    fn open_app(&self, name: &str) -> Result<BoxFuture<'static, OpenAppEvent>, MachineFault> {
        let mut builder = ApduBuilder::new(0xE0, 0xD8, 0x00, 0x00);
        builder.add_ascii(name);
        let apdu = builder
            .try_build()
            .map_err(|e| MachineFault::other(e.to_string()))?;
        let api = Arc::clone(&self.api);
        Ok(async move {
            let response = api.send_command(apdu).await;
            OpenAppEvent::Opened(response)
        }
        .boxed())
    }
}

impl StateMachine for OpenAppMachine {
    type Input = String;
    type Output = ();
    type Error = OpenAppError;
    type IntermediateValue = DeviceActionIntermediateValue;
    type InternalState = Option<AppAndVersion>;
    type State = OpenAppState;
    type Event = OpenAppEvent;

    fn id(&self) -> &'static str {
        "open-app"
    }

    fn initial_context(&self, input: String) -> Context<Self> {
        ActionContext {
            input,
            state: OpenAppState::FetchingCurrentApp,
            intermediate_value: DeviceActionIntermediateValue::default(),
            internal_state: None,
        }
    }

    fn start(&self, _context: &mut Context<Self>) -> Result<Step<Self>, MachineFault> {
        Ok(Step::Invoke(self.fetch_current_app()))
    }

    fn transition(
        &self,
        context: &mut Context<Self>,
        event: OpenAppEvent,
    ) -> Result<Step<Self>, MachineFault> {
        use OpenAppEvent::*;
        use OpenAppState::*;

        match (context.state, event) {
            (FetchingCurrentApp, CurrentApp(Ok(app))) => {
                let running = app.name == context.input;
                context.internal_state = Some(app);
                if running {
                    return Ok(Step::Done(Ok(())));
                }
                context.state = OpeningApp;
                context.intermediate_value =
                    DeviceActionIntermediateValue::new(UserInteractionRequired::ConfirmOpenApp);
                Ok(Step::Invoke(self.open_app(&context.input)?))
            }
            (FetchingCurrentApp, CurrentApp(Err(CommandError::Command(e))))
                if e.status_word().is_some_and(|sw| sw.is_locked_device()) =>
            {
                Ok(Step::Done(Err(OpenAppError::Locked)))
            }
            (FetchingCurrentApp, CurrentApp(Err(CommandError::Command(Error::ParseError(_))))) => {
                Ok(Step::Raise(Malformed))
            }
            (FetchingCurrentApp, CurrentApp(Err(e))) => {
                Ok(Step::Done(Err(OpenAppError::Exchange(e.to_string()))))
            }
            (OpeningApp, Opened(Ok(response))) if response.is_success() => Ok(Step::Done(Ok(()))),
            (OpeningApp, Opened(Ok(response))) if response.status().is_refused_by_user() => {
                Ok(Step::Done(Err(OpenAppError::Refused)))
            }
            (OpeningApp, Opened(Ok(response))) => Ok(Step::Done(Err(OpenAppError::Exchange(
                response.status().to_string(),
            )))),
            (OpeningApp, Opened(Err(e))) => {
                Ok(Step::Done(Err(OpenAppError::Exchange(e.to_string()))))
            }
            (state, event) => Err(MachineFault::unexpected(&event, &state)),
        }
    }

    fn on_stop(&self, _context: &Context<Self>) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Action wrapper counting how often its machine is built and stopped
#[derive(Debug, Default)]
pub struct OpenApp {
    pub app: String,
    pub built: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl OpenApp {
    pub fn new(app: &str) -> Self {
        Self {
            app: app.to_owned(),
            ..Default::default()
        }
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl DeviceAction for OpenApp {
    type Machine = OpenAppMachine;

    fn input(&self) -> String {
        self.app.clone()
    }

    fn inspect(&self) -> bool {
        true
    }

    fn make_state_machine(&self, api: Arc<dyn InternalApi>) -> OpenAppMachine {
        self.built.fetch_add(1, Ordering::SeqCst);
        OpenAppMachine {
            api,
            stops: Arc::clone(&self.stops),
        }
    }
}

pub type Progress = ActionState<OpenAppMachine>;
