//! Event listener wiring.
//!
//! Static buttons are wired once here; dynamically rendered cards wire
//! their own buttons at render time.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::documents_view;
use crate::dom::Elements;
use crate::upload_view;
use crate::wallet_view;

fn on_click<F>(target: &web_sys::HtmlElement, handler: F)
where
    F: Fn() + 'static,
{
    let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| handler()) as Box<dyn FnMut(_)>);
    target
        .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
        .unwrap();
    cb.forget();
}

pub fn bind_events(els: &Elements) {
    let e = els.clone();
    on_click(&els.connect_btn, move || {
        wallet_view::open_modal(&e);
    });

    let e = els.clone();
    on_click(&els.wallet_modal_close, move || {
        wallet_view::close_modal(&e);
    });

    let e = els.clone();
    on_click(&els.disconnect_btn, move || {
        wallet_view::on_disconnect(&e);
    });

    let e = els.clone();
    on_click(&els.upload_btn, move || {
        let els2 = e.clone();
        wasm_bindgen_futures::spawn_local(async move {
            upload_view::on_upload(&els2).await;
        });
    });

    let e = els.clone();
    on_click(&els.docs_prev_btn, move || {
        documents_view::prev_page(&e);
    });

    let e = els.clone();
    on_click(&els.docs_next_btn, move || {
        documents_view::next_page(&e);
    });

    let e = els.clone();
    on_click(&els.refresh_tokens_btn, move || {
        crate::tokens_view::refresh(&e);
    });
}
