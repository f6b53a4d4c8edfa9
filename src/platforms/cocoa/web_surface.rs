use async_trait::async_trait;
use block2::{DynBlock, RcBlock};
use dispatch::Queue;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, NSObject, ProtocolObject};
use objc2::{DefinedClass, MainThreadMarker, MainThreadOnly, define_class, msg_send};
use objc2_foundation::{
    NSError, NSJSONSerialization, NSJSONWritingOptions, NSNumber, NSObjectProtocol, NSRect,
    NSString, NSURL,
};
use objc2_web_kit::{
    WKNavigationAction, WKNavigationActionPolicy, WKNavigationDelegate, WKScriptMessage,
    WKScriptMessageHandler, WKUserContentController, WKWebView, WKWebViewConfiguration,
};
use serde_json::Value;
use std::cell::Cell;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::config::{BridgeConfig, Transport};
use crate::player::{InboundSender, NavigationPolicy, SurfaceError, WebSurface};

define_class!(
    // Receives page notifications and forwards them into the inbound queue.
    // It holds only the queue sender, so WebKit retaining it keeps nothing
    // else alive.
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "YTPlayerBridgeProxy"]
    #[ivars = InboundSender]
    struct BridgeProxy;

    unsafe impl NSObjectProtocol for BridgeProxy {}

    unsafe impl WKNavigationDelegate for BridgeProxy {
        #[unsafe(method(webView:decidePolicyForNavigationAction:decisionHandler:))]
        fn decide_policy_for_navigation_action(
            &self,
            _web_view: &WKWebView,
            navigation_action: &WKNavigationAction,
            decision_handler: &DynBlock<dyn Fn(WKNavigationActionPolicy)>,
        ) {
            let url = unsafe { navigation_action.request().URL() }
                .and_then(|url| unsafe { url.absoluteString() })
                .map(|url| url.to_string());

            let policy = match url {
                Some(url) => self.ivars().navigation(&url),
                None => NavigationPolicy::Allow,
            };

            decision_handler.call((match policy {
                NavigationPolicy::Allow => WKNavigationActionPolicy::Allow,
                NavigationPolicy::Cancel => WKNavigationActionPolicy::Cancel,
            },));
        }
    }

    unsafe impl WKScriptMessageHandler for BridgeProxy {
        #[unsafe(method(userContentController:didReceiveScriptMessage:))]
        fn did_receive_script_message(
            &self,
            _user_content_controller: &WKUserContentController,
            message: &WKScriptMessage,
        ) {
            let body = unsafe { message.body() };
            match script_message_text(&body) {
                Some(text) => self.ivars().script_message(text),
                None => debug!("Ignoring script message that is not JSON"),
            }
        }
    }
);

impl BridgeProxy {
    fn new(mtm: MainThreadMarker, inbound: InboundSender) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(inbound);
        unsafe { msg_send![super(this), init] }
    }
}

struct SurfaceObjects {
    web_view: Retained<WKWebView>,
    // navigationDelegate is weak
    proxy: Retained<BridgeProxy>,
    message_handler: Option<Retained<NSString>>,
}

impl SurfaceObjects {
    fn detach(&self) {
        // The content controller retains its handlers until told otherwise
        if let Some(name) = &self.message_handler {
            let controller = unsafe { self.web_view.configuration().userContentController() };
            unsafe { controller.removeScriptMessageHandlerForName(name) };
        }
        unsafe { self.web_view.setNavigationDelegate(None) };
        trace!("Detached bridge proxy {:p}", &*self.proxy);
    }
}

// Only dereferenced inside closures running on the main queue.
struct MainQueueBound(SurfaceObjects);

unsafe impl Send for MainQueueBound {}
unsafe impl Sync for MainQueueBound {}

impl Drop for MainQueueBound {
    fn drop(&mut self) {
        // Last references travel to the main queue so WebKit objects are
        // released there
        let teardown = Teardown(SurfaceObjects {
            web_view: self.0.web_view.clone(),
            proxy: self.0.proxy.clone(),
            message_handler: self.0.message_handler.take(),
        });
        Queue::main().exec_async(move || teardown.run());
    }
}

struct Teardown(SurfaceObjects);

unsafe impl Send for Teardown {}

impl Teardown {
    fn run(self) {
        self.0.detach();
    }
}

/// [`WebSurface`] backed by a `WKWebView`.
///
/// Build it on the main thread, add [`CocoaWebSurface::web_view`] to a view
/// hierarchy, then hand the surface to the player controller.
///
/// WebKit work happens on the main queue, but delegate handlers do not: the
/// controller invokes them from its tokio task. Handlers that touch AppKit
/// must hop back with `dispatch::Queue::main().exec_async`.
pub struct CocoaWebSurface {
    objects: Arc<MainQueueBound>,
}

impl CocoaWebSurface {
    pub fn new(
        mtm: MainThreadMarker,
        frame: NSRect,
        bridge: &BridgeConfig,
        inbound: InboundSender,
    ) -> Self {
        let proxy = BridgeProxy::new(mtm, inbound);
        let configuration = unsafe { WKWebViewConfiguration::new(mtm) };

        let message_handler = match bridge.transport {
            Transport::MessageChannel => {
                let name = NSString::from_str(&bridge.message_handler);
                let controller = unsafe { configuration.userContentController() };
                unsafe {
                    controller
                        .addScriptMessageHandler_name(ProtocolObject::from_ref(&*proxy), &name)
                };
                debug!("Registered message handler {:?}", bridge.message_handler);
                Some(name)
            }
            Transport::UrlScheme => None,
        };

        let web_view = unsafe {
            WKWebView::initWithFrame_configuration(WKWebView::alloc(mtm), frame, &configuration)
        };
        // Always installed: pages may fall back to scheme navigation
        unsafe { web_view.setNavigationDelegate(Some(ProtocolObject::from_ref(&*proxy))) };

        Self {
            objects: Arc::new(MainQueueBound(SurfaceObjects {
                web_view,
                proxy,
                message_handler,
            })),
        }
    }

    pub fn web_view(&self, _mtm: MainThreadMarker) -> &WKWebView {
        &self.objects.0.web_view
    }

    async fn on_main<T: Send + 'static>(
        &self,
        work: impl FnOnce(&SurfaceObjects, oneshot::Sender<T>) + Send + 'static,
    ) -> Result<T, SurfaceError> {
        let objects = self.objects.clone();
        let (respond_to, response) = oneshot::channel();
        Queue::main().exec_async(move || work(&objects.0, respond_to));
        response.await.map_err(|_| SurfaceError::Detached)
    }
}

#[async_trait]
impl WebSurface for CocoaWebSurface {
    async fn load_html(&self, html: &str, base_url: &str) -> Result<(), SurfaceError> {
        let html = html.to_string();
        let base_url = base_url.to_string();

        self.on_main(move |objects, respond_to| {
            let base = unsafe { NSURL::URLWithString(&NSString::from_str(&base_url)) };
            if base.is_none() {
                warn!("Base URL {:?} is not a URL, loading without one", base_url);
            }
            let navigation = unsafe {
                objects
                    .web_view
                    .loadHTMLString_baseURL(&NSString::from_str(&html), base.as_deref())
            };
            let result = match navigation {
                Some(_) => Ok(()),
                None => Err(SurfaceError::Load("WKWebView refused the document".to_string())),
            };
            let _ = respond_to.send(result);
        })
        .await?
    }

    async fn evaluate_script(&self, script: &str) -> Result<Option<Value>, SurfaceError> {
        let script = script.to_string();

        self.on_main(move |objects, respond_to| {
            trace!("evaluateJavaScript: {}", script);
            let respond_to = Cell::new(Some(respond_to));
            let completion = RcBlock::new(move |result: *mut AnyObject, error: *mut NSError| {
                let Some(respond_to) = respond_to.take() else {
                    return;
                };
                let reply = match unsafe { error.as_ref() } {
                    Some(error) => Err(SurfaceError::Script(
                        error.localizedDescription().to_string(),
                    )),
                    None => Ok(unsafe { result.as_ref() }.and_then(script_value)),
                };
                let _ = respond_to.send(reply);
            });
            unsafe {
                objects
                    .web_view
                    .evaluateJavaScript_completionHandler(&NSString::from_str(&script), Some(&*completion))
            };
        })
        .await?
    }
}

/// Text form of a posted message body. Strings pass through; objects and
/// arrays are serialized back to JSON.
fn script_message_text(body: &AnyObject) -> Option<String> {
    if let Some(text) = body.downcast_ref::<NSString>() {
        return Some(text.to_string());
    }
    if let Some(number) = body.downcast_ref::<NSNumber>() {
        return Some(number.stringValue().to_string());
    }
    // dataWithJSONObject raises on anything this rejects
    if !unsafe { NSJSONSerialization::isValidJSONObject(body) } {
        return None;
    }

    match unsafe {
        NSJSONSerialization::dataWithJSONObject_options_error(body, NSJSONWritingOptions::empty())
    } {
        Ok(data) => String::from_utf8(data.to_vec()).ok(),
        Err(error) => {
            warn!(
                "Could not serialize script message: {}",
                error.localizedDescription()
            );
            None
        }
    }
}

/// Completion values the bridge reads are numbers and strings.
fn script_value(object: &AnyObject) -> Option<Value> {
    if let Some(text) = object.downcast_ref::<NSString>() {
        return Some(Value::String(text.to_string()));
    }
    if let Some(number) = object.downcast_ref::<NSNumber>() {
        return serde_json::Number::from_f64(number.doubleValue()).map(Value::Number);
    }
    trace!("Ignoring script result of unsupported type");
    None
}
