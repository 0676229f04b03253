use log::{info, warn};
use url::Url;

use crate::config::PageConfig;

use super::{
    animation::FrameIndex,
    animator::ScrollAnimator,
    auth::PasswordGate,
    host::{AnimationFrameHandle, PageHost},
    preload::FramePreloader,
    routes::{Resolution, Route, resolve},
};

/// Async work a session state change asks the runtime to start.
pub enum PageTask {
    Preload {
        variant: String,
        preloader: FramePreloader,
    },
}

/// Everything the visitor sees: current route, password state and the
/// animator of the page on screen.
pub struct LandingSession<H: PageHost> {
    host: H,
    config: PageConfig,
    base_url: Option<Url>,
    password: PasswordGate,
    route: Option<Route>,
    return_to: Option<Route>,
    animator: Option<ScrollAnimator>,
}

impl<H: PageHost> LandingSession<H> {
    pub fn new(host: H, config: PageConfig, base_url: Option<Url>) -> LandingSession<H> {
        let password = PasswordGate::new(config.password.clone());
        LandingSession {
            host,
            config,
            base_url,
            password,
            route: None,
            return_to: None,
            animator: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn route(&self) -> Option<Route> {
        self.route
    }

    pub fn is_authenticated(&self) -> bool {
        self.password.is_authenticated()
    }

    pub fn animator(&self) -> Option<&ScrollAnimator> {
        self.animator.as_ref()
    }

    pub fn navigate(&mut self, path: &str) -> Option<PageTask> {
        let route = match resolve(
            path,
            self.password.is_enabled(),
            self.password.is_authenticated(),
        ) {
            Resolution::Render(route) => route,
            Resolution::Redirect { to, from } => {
                info!("Redirecting {} to {}", path, to.path());
                if from.is_some() {
                    self.return_to = from;
                }
                to
            }
        };
        self.show(route)
    }

    pub fn login(&mut self, attempt: &str) -> Option<PageTask> {
        match self.password.login(attempt) {
            Ok(()) => {
                self.host.show_login_error(None);
                let target = self.return_to.take().unwrap_or(Route::Home);
                self.navigate(target.path())
            }
            Err(err) => {
                self.host.show_login_error(Some(&err.to_string()));
                None
            }
        }
    }

    pub fn logout(&mut self) -> Option<PageTask> {
        self.password.logout();
        let current = self.route.unwrap_or(Route::Home);
        self.navigate(current.path())
    }

    pub fn scroll(&mut self, scroll_y: f64, at_ms: f64) {
        if let Some(animator) = self.animator.as_mut() {
            animator.on_scroll(&self.host, scroll_y, at_ms);
        }
    }

    pub fn animation_frame(&mut self, handle: AnimationFrameHandle, at_ms: f64) {
        if let Some(animator) = self.animator.as_mut() {
            animator.on_animation_frame(&self.host, handle, at_ms);
        }
    }

    pub fn timeout_triggered(&mut self, name: &str) {
        let handled = self
            .animator
            .as_mut()
            .is_some_and(|x| x.on_timeout(&self.host, name));
        if !handled {
            warn!("Timeout {} is not scheduled", name);
        }
    }

    pub fn primary_media_ended(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.on_primary_media_ended(&self.host);
        }
    }

    /// Preload callbacks of a page that has since been left are dropped.
    pub fn frame_loaded(&mut self, variant: &str, frame: FrameIndex) {
        if let Some(animator) = self
            .animator
            .as_mut()
            .filter(|x| x.variant_name() == variant)
        {
            animator.on_frame_loaded(&self.host, frame);
        }
    }

    /// Unmounts the page. The next navigation starts from scratch.
    pub fn teardown(&mut self) {
        self.unmount();
        self.route = None;
    }

    fn unmount(&mut self) {
        if let Some(mut animator) = self.animator.take() {
            animator.teardown(&self.host);
        }
    }

    fn show(&mut self, route: Route) -> Option<PageTask> {
        if self.route == Some(route) {
            return None;
        }
        self.unmount();
        self.route = Some(route);
        self.host.show_route(route);

        if !route.is_animated() {
            return None;
        }
        let Some(variant) = self.config.variants.by_route(route.path()) else {
            warn!("No page variant configured for {}", route.path());
            return None;
        };

        let preloader = FramePreloader::new(variant, self.base_url.clone());
        let mut animator = ScrollAnimator::new(variant, preloader.store());
        animator.mount(&self.host);
        self.animator = Some(animator);
        Some(PageTask::Preload {
            variant: variant.name.to_owned(),
            preloader,
        })
    }
}
