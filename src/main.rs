use std::sync::Arc;

use fighter::app::EventLoop;
use fighter::demo::Demo;
use fighter::settings::Settings;
use fighter::terminal::{Terminal, TerminalDialogs};

fn main() -> fighter::Result {
    fighter::initialize_tracing();

    let settings = Settings::from_env();
    let event_loop = EventLoop::new();
    let dialogs = Arc::new(TerminalDialogs::new());
    let demo = Demo::new(&settings, dialogs.clone());

    #[cfg(feature = "requests")]
    {
        use fighter::app::TokioRuntime;
        use fighter::requests::{ReqwestClient, RequestManager};

        let requests = RequestManager::new(
            ReqwestClient::new()?,
            TokioRuntime::spawn()?,
            event_loop.proxy(),
        )
        .with_endpoint(settings.endpoint.clone())
        .with_payload(settings.payload.clone());
        demo.add_request_buttons(&requests);
    }

    Terminal::new(demo.window.clone(), event_loop, dialogs).run()?;
    drop(demo);
    Ok(())
}
