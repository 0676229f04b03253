use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use async_std::{
    channel::{self, Receiver, Sender},
    task::spawn_local,
};
use futures::future::{AbortHandle, abortable};
use log::{debug, error, info, warn};
use url::Url;

use crate::{
    config::PageConfig,
    net::Transport,
    storefront::{CheckoutSource, StorefrontClient},
};

use super::{
    animation::FrameIndex,
    host::{AnimationFrameHandle, PageHost},
    inventory::{InventoryCounter, InventoryPoller},
    session::{LandingSession, PageTask},
};

pub enum PageCommand {
    Navigate(String),
    Scroll { scroll_y: f64, at_ms: f64 },
    AnimationFrame { handle: u32, at_ms: f64 },
    TimeoutTriggered(String),
    PrimaryMediaEnded,
    FrameLoaded { variant: String, frame: FrameIndex },
    Login(String),
    Logout,
    Acquire,
    Teardown,
}

pub fn describe_page_command(command: &PageCommand) -> String {
    match command {
        PageCommand::Navigate(path) => format!("Navigate({})", path),
        PageCommand::Scroll { scroll_y, .. } => format!("Scroll({})", scroll_y),
        PageCommand::AnimationFrame { handle, .. } => format!("AnimationFrame({})", handle),
        PageCommand::TimeoutTriggered(name) => format!("TimeoutTriggered({})", name),
        PageCommand::PrimaryMediaEnded => "PrimaryMediaEnded".to_string(),
        PageCommand::FrameLoaded { variant, frame } => {
            format!("FrameLoaded({}, {})", variant, frame)
        }
        PageCommand::Login(_) => "Login".to_string(),
        PageCommand::Logout => "Logout".to_string(),
        PageCommand::Acquire => "Acquire".to_string(),
        PageCommand::Teardown => "Teardown".to_string(),
    }
}

/// Owns the session and the background tasks started on its behalf.
pub struct PageRuntime<H, T>
where
    H: PageHost + Clone + 'static,
    T: Transport + 'static,
{
    session: LandingSession<H>,
    transport: Rc<T>,
    storefront: Rc<StorefrontClient<Rc<T>>>,
    inventory: Rc<RefCell<InventoryCounter>>,
    poller: InventoryPoller,
    checkout_in_flight: Rc<Cell<bool>>,
    preload_task: Option<AbortHandle>,
    inventory_task: Option<AbortHandle>,
    tx: Sender<PageCommand>,
}

impl<H, T> PageRuntime<H, T>
where
    H: PageHost + Clone + 'static,
    T: Transport + 'static,
{
    pub fn new(
        host: H,
        transport: T,
        config: PageConfig,
        base_url: Option<Url>,
        tx: Sender<PageCommand>,
    ) -> PageRuntime<H, T> {
        let transport = Rc::new(transport);
        let storefront = Rc::new(StorefrontClient::new(
            config.storefront.clone(),
            Rc::clone(&transport),
        ));
        PageRuntime {
            session: LandingSession::new(host, config, base_url),
            transport,
            storefront,
            inventory: Rc::new(RefCell::new(InventoryCounter::default())),
            poller: InventoryPoller::default(),
            checkout_in_flight: Rc::new(Cell::new(false)),
            preload_task: None,
            inventory_task: None,
            tx,
        }
    }

    pub fn with_inventory_poller(mut self, poller: InventoryPoller) -> PageRuntime<H, T> {
        self.poller = poller;
        self
    }

    pub fn session(&self) -> &LandingSession<H> {
        &self.session
    }

    pub fn inventory(&self) -> Rc<RefCell<InventoryCounter>> {
        Rc::clone(&self.inventory)
    }

    pub fn apply(&mut self, command: PageCommand) {
        let task = match command {
            PageCommand::Navigate(path) => self.session.navigate(&path),
            PageCommand::Scroll { scroll_y, at_ms } => {
                self.session.scroll(scroll_y, at_ms);
                None
            }
            PageCommand::AnimationFrame { handle, at_ms } => {
                self.session
                    .animation_frame(AnimationFrameHandle(handle), at_ms);
                None
            }
            PageCommand::TimeoutTriggered(name) => {
                self.session.timeout_triggered(&name);
                None
            }
            PageCommand::PrimaryMediaEnded => {
                self.session.primary_media_ended();
                None
            }
            PageCommand::FrameLoaded { variant, frame } => {
                self.session.frame_loaded(&variant, frame);
                None
            }
            PageCommand::Login(attempt) => self.session.login(&attempt),
            PageCommand::Logout => self.session.logout(),
            PageCommand::Acquire => {
                self.start_checkout();
                None
            }
            PageCommand::Teardown => {
                self.teardown();
                None
            }
        };
        if let Some(task) = task {
            self.start_task(task);
        }
        // Polling stops on teardown and resumes with the next page shown.
        if self.session.route().is_some() {
            self.start_inventory();
        }
    }

    fn start_inventory(&mut self) {
        if self.inventory_task.is_some() {
            return;
        }
        let host = self.session.host().clone();
        host.show_inventory(&self.inventory.borrow().label());

        let client = Rc::clone(&self.storefront);
        let counter = Rc::clone(&self.inventory);
        let poller = self.poller;
        let (task, handle) = abortable(async move {
            poller.run(&*client, &*counter, &host).await;
        });
        spawn_local(async move {
            if task.await.is_err() {
                debug!("Inventory polling stopped");
            }
        });
        self.inventory_task = Some(handle);
    }

    fn start_task(&mut self, task: PageTask) {
        match task {
            PageTask::Preload { variant, preloader } => {
                if let Some(previous) = self.preload_task.take() {
                    previous.abort();
                }
                let transport = Rc::clone(&self.transport);
                let tx = self.tx.clone();
                let (task, handle) = abortable(async move {
                    let report = preloader
                        .run(&transport, |frame, _| {
                            let command = PageCommand::FrameLoaded {
                                variant: variant.to_owned(),
                                frame,
                            };
                            if let Err(err) = tx.try_send(command) {
                                warn!("Failed to report loaded frame: {:?}", err);
                            }
                        })
                        .await;
                    info!(
                        "Frames for {} ready: {} loaded, {} failed",
                        variant, report.loaded, report.failed
                    );
                });
                spawn_local(async move {
                    if task.await.is_err() {
                        debug!("Frame preload aborted");
                    }
                });
                self.preload_task = Some(handle);
            }
        }
    }

    fn start_checkout(&self) {
        if self.checkout_in_flight.replace(true) {
            debug!("Checkout already in progress");
            return;
        }
        let client = Rc::clone(&self.storefront);
        let host = self.session.host().clone();
        let in_flight = Rc::clone(&self.checkout_in_flight);
        spawn_local(async move {
            let target = client.start_checkout().await;
            if let CheckoutSource::Fallback(reason) = &target.source {
                warn!("Using fallback checkout: {}", reason);
            }
            in_flight.set(false);
            host.redirect(&target.url);
        });
    }

    pub fn teardown(&mut self) {
        self.session.teardown();
        for handle in [self.preload_task.take(), self.inventory_task.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

thread_local! {
    static PAGE_TX: RefCell<Option<Sender<PageCommand>>> = const { RefCell::new(None) };
}

pub async fn run_command_loop<H, T>(rx: Receiver<PageCommand>, mut runtime: PageRuntime<H, T>)
where
    H: PageHost + Clone + 'static,
    T: Transport + 'static,
{
    debug!("Starting command loop");
    while let Ok(command) = rx.recv().await {
        debug!("Page command: {}", describe_page_command(&command));
        runtime.apply(command);
    }
    runtime.teardown();
    warn!("Command loop stopped!")
}

pub fn page_dispatch(command: PageCommand) {
    PAGE_TX.with_borrow(|tx| match tx {
        Some(tx) => {
            if let Err(e) = tx.try_send(command) {
                // The channel is closed or full
                error!("Failed to send command to page: {:?}", e);
            }
        }
        None => error!("PAGE_TX not initialized"),
    });
}

/// Routes to `path`, which also starts inventory polling, then starts the
/// command loop.
pub fn init_page<H, T>(host: H, transport: T, config: PageConfig, base_url: Option<Url>, path: &str)
where
    H: PageHost + Clone + 'static,
    T: Transport + 'static,
{
    let (tx, rx) = channel::unbounded();
    if let Some(previous) = PAGE_TX.replace(Some(tx.clone())) {
        warn!("Replacing running page");
        previous.close();
    }

    let mut runtime = PageRuntime::new(host, transport, config, base_url, tx);
    runtime.apply(PageCommand::Navigate(path.to_owned()));
    spawn_local(run_command_loop(rx, runtime));
}
