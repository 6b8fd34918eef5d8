//! The "Choose your fighter!" window.

use std::sync::Arc;

use tracing::error;

use crate::dialog::{DialogPresenter, MessageTrigger};
use crate::event::CallbackHandle;
use crate::layout::Layout;
use crate::registry::WidgetRegistry;
use crate::settings::Settings;
use crate::widgets::{Button, Label};
use crate::window::Window;

/// The demo window and the components wired into it.
///
/// The connections between the trigger buttons and the registry last as long
/// as this value.
#[derive(Debug)]
pub struct Demo {
    /// The window to display.
    pub window: Window,
    /// Manages the buttons created by the trigger buttons.
    pub registry: WidgetRegistry,
    /// Shows modal messages.
    pub messages: MessageTrigger,
    request_row: Layout,
    _connections: CallbackHandle,
}

impl Demo {
    /// Builds the demo window described by `settings`, showing messages with
    /// `presenter`.
    #[must_use]
    pub fn new(settings: &Settings, presenter: Arc<dyn DialogPresenter>) -> Self {
        let button_row = Layout::columns();
        let registry = WidgetRegistry::new(button_row.clone());
        let messages = MessageTrigger::new(presenter);

        let mut connections = CallbackHandle::default();
        for label in &settings.trigger_labels {
            let (trigger, created) = Button::trigger(label.as_str());
            connections += registry.connect(&created);
            if settings.announce {
                connections += messages.connect(&created);
            }
            if let Err(err) = button_row.append(trigger) {
                error!(%err, "unable to add trigger button");
            }
        }

        let prompt_row = Layout::columns();
        prompt_row.add_stretch();
        if let Err(err) = prompt_row.append(Label::new(settings.prompt.as_str())) {
            error!(%err, "unable to add prompt");
        }
        prompt_row.add_stretch();

        let request_row = Layout::columns();

        let root = Layout::rows();
        root.add_stretch();
        root.add_layout(prompt_row);
        root.add_layout(button_row);
        root.add_layout(request_row.clone());
        root.add_stretch();

        Self {
            window: Window::new(root)
                .titled(settings.title.as_str())
                .with_geometry(settings.geometry),
            registry,
            messages,
            request_row,
            _connections: connections,
        }
    }

    /// Adds GET and POST buttons that send requests with `requests` and print
    /// each response.
    #[cfg(feature = "requests")]
    pub fn add_request_buttons(&self, requests: &crate::requests::RequestManager) {
        let get = Button::new("GET").on_click({
            let requests = requests.clone();
            move || requests.get(print_response)
        });
        let post = Button::new("POST").on_click({
            let requests = requests.clone();
            move || requests.post(requests.payload(), print_response)
        });
        for button in [get, post] {
            if let Err(err) = self.request_row.append(button) {
                error!(%err, "unable to add request button");
            }
        }
    }
}

#[cfg(feature = "requests")]
fn print_response(result: Result<serde_json::Value, crate::requests::NetworkError>) {
    // Failures are already logged by the request manager.
    if let Ok(body) = result {
        println!("{body:#}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::Demo;
    use crate::dialog::{DialogPresenter, MessageBox};
    use crate::settings::Settings;

    #[derive(Default)]
    struct Shown(Mutex<Vec<String>>);

    impl DialogPresenter for Shown {
        fn present(&self, message: &MessageBox) {
            self.0.lock().push(message.text().to_string());
        }
    }

    #[test]
    fn window_layout() {
        let demo = Demo::new(&Settings::default(), Arc::new(Shown::default()));
        assert_eq!(
            demo.window.render(),
            "== My window (600x600 at 200,200) ==\n\
             rows\n  \
               ~\n  \
               columns\n    \
                 ~\n    \
                 Choose your fighter!\n    \
                 ~\n  \
               columns\n    \
                 [1] Push me!\n    \
                 [2] No, push me!\n  \
               columns\n  \
               ~\n"
        );
    }

    #[test]
    fn triggers_add_and_created_buttons_remove() {
        let demo = Demo::new(&Settings::default(), Arc::new(Shown::default()));
        let push = demo.window.find_clickable("Push me!").expect("trigger");
        let no = demo.window.find_clickable("No, push me!").expect("trigger");

        push.click();
        no.click();
        no.click();
        assert_eq!(
            demo.registry.layout().labels(),
            ["Push me!", "No, push me!", "Push me!", "No, push me!", "No, push me!"]
        );
        assert_eq!(demo.registry.len(), 3);

        let created = demo.registry.layout().widgets()[3].clone();
        created.click();
        assert_eq!(
            demo.registry.layout().labels(),
            ["Push me!", "No, push me!", "Push me!", "No, push me!"]
        );
        assert!(created.is_destroyed());
    }

    #[test]
    fn announcing_shows_messages() {
        let shown = Arc::new(Shown::default());
        let settings = Settings {
            announce: true,
            ..Settings::default()
        };
        let demo = Demo::new(&settings, shown.clone());
        demo.window
            .find_clickable("No, push me!")
            .expect("trigger")
            .click();

        assert_eq!(*shown.0.lock(), ["No, push me!"]);
        assert_eq!(demo.registry.len(), 1);
    }

    #[test]
    fn trigger_buttons_are_not_managed() {
        let demo = Demo::new(&Settings::default(), Arc::new(Shown::default()));
        let push = demo.window.find_clickable("Push me!").expect("trigger");
        assert!(!demo.registry.on_remove(&push));
        assert!(!push.is_destroyed());
        assert_eq!(demo.registry.layout().widget_count(), 2);
    }
}
