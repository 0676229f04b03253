#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Mirror,
    Password,
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Home),
            "/mirror" => Some(Route::Mirror),
            "/password" => Some(Route::Password),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Mirror => "/mirror",
            Route::Password => "/password",
        }
    }

    pub fn is_animated(self) -> bool {
        matches!(self, Route::Home | Route::Mirror)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    /// Replace the current location. `from` is where a successful login
    /// should send the visitor back to.
    Redirect { to: Route, from: Option<Route> },
}

pub fn resolve(path: &str, gate_enabled: bool, authenticated: bool) -> Resolution {
    let Some(route) = Route::parse(path) else {
        // Unknown paths go through the same checks as the home page.
        return match resolve(Route::Home.path(), gate_enabled, authenticated) {
            Resolution::Render(home) => Resolution::Redirect {
                to: home,
                from: None,
            },
            redirect => redirect,
        };
    };
    match route {
        Route::Password if !gate_enabled || authenticated => Resolution::Redirect {
            to: Route::Home,
            from: None,
        },
        Route::Password => Resolution::Render(Route::Password),
        protected if gate_enabled && !authenticated => Resolution::Redirect {
            to: Route::Password,
            from: Some(protected),
        },
        open => Resolution::Render(open),
    }
}
