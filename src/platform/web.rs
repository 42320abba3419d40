//! Browser backend: canvas 2D surface, WebSocket transport and DOM HUD

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, CanvasWindingRule, CloseEvent, Document, HtmlCanvasElement,
    MessageEvent, WebSocket,
};

use crate::net::{NetError, Transport, TransportEvent};
use crate::renderer::{DrawCmd, DrawList, RenderSurface};
use crate::session::Presentation;
use crate::sim::DeathCause;

/// Render surface over a `<canvas>` 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up the canvas by id; `None` if it or its 2D context is missing
    pub fn from_id(document: &Document, id: &str) -> Option<Self> {
        let canvas: HtmlCanvasElement = document.get_element_by_id(id)?.dyn_into().ok()?;
        let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
        Some(Self { canvas, ctx })
    }

    /// Match the backing store to the element's layout size
    pub fn fit_to_client(&self) {
        let w = self.canvas.client_width().max(0) as u32;
        let h = self.canvas.client_height().max(0) as u32;
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    fn trace_polygon(&self, points: &[Vec2]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
    }

    fn draw(&self, cmd: &DrawCmd) {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::Clear(color) => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.fill_rect(
                    0.0,
                    0.0,
                    self.canvas.width() as f64,
                    self.canvas.height() as f64,
                );
            }
            DrawCmd::Rect { min, size, fill } => {
                ctx.set_fill_style_str(&fill.to_css());
                ctx.fill_rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
            }
            DrawCmd::Circle {
                center,
                radius,
                fill,
            } => {
                ctx.begin_path();
                let _ = ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    radius.max(0.0) as f64,
                    0.0,
                    std::f64::consts::TAU,
                );
                ctx.set_fill_style_str(&fill.to_css());
                ctx.fill();
            }
            DrawCmd::Line {
                from,
                to,
                width,
                color,
            } => {
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.set_line_width(*width as f64);
                ctx.set_stroke_style_str(&color.to_css());
                ctx.stroke();
            }
            DrawCmd::Text {
                pos,
                text,
                size,
                color,
            } => {
                ctx.set_font(&format!("{size}px sans-serif"));
                ctx.set_text_align("center");
                ctx.set_fill_style_str(&color.to_css());
                let _ = ctx.fill_text(text, pos.x as f64, pos.y as f64);
            }
            DrawCmd::EvenOddPath { subpaths, fill } => {
                ctx.begin_path();
                for poly in subpaths {
                    self.trace_polygon(poly);
                }
                ctx.set_fill_style_str(&fill.to_css());
                ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
            }
        }
    }
}

impl RenderSurface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn submit(&mut self, list: &DrawList) {
        for (_, cmd) in &list.items {
            self.draw(cmd);
        }
    }
}

/// Text-frame transport over a browser WebSocket
pub struct WebSocketTransport {
    socket: WebSocket,
    inbound: Rc<RefCell<VecDeque<TransportEvent>>>,
}

impl WebSocketTransport {
    pub fn connect(url: &str) -> Result<Self, NetError> {
        let socket = WebSocket::new(url).map_err(|e| NetError::Transport(format!("{e:?}")))?;
        let inbound: Rc<RefCell<VecDeque<TransportEvent>>> = Rc::default();

        {
            let inbound = inbound.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                inbound.borrow_mut().push_back(TransportEvent::Opened);
            });
            socket.set_onopen(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let inbound = inbound.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
                if let Some(text) = event.data().as_string() {
                    inbound.borrow_mut().push_back(TransportEvent::Frame(text));
                }
            });
            socket.set_onmessage(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let inbound = inbound.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: CloseEvent| {
                log::info!("WebSocket closed (code {})", event.code());
                inbound.borrow_mut().push_back(TransportEvent::Closed);
            });
            socket.set_onclose(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        Ok(Self { socket, inbound })
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, frame: &str) -> Result<(), NetError> {
        if self.socket.ready_state() != WebSocket::OPEN {
            return Err(NetError::NotConnected);
        }
        self.socket
            .send_with_str(frame)
            .map_err(|e| NetError::Transport(format!("{e:?}")))
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.inbound.borrow_mut().pop_front()
    }
}

/// HUD and overlays written straight into the page
pub struct DomPresentation {
    document: Document,
}

impl DomPresentation {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show(&self, id: &str, visible: bool) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }
}

impl Presentation for DomPresentation {
    fn set_score(&mut self, score: u64) {
        self.set_text("hud-score", &score.to_string());
    }

    fn set_health(&mut self, hp: i32) {
        self.set_text("hud-health", &hp.to_string());
    }

    fn set_ammo(&mut self, ammo: u32) {
        self.set_text("hud-ammo", &ammo.to_string());
    }

    fn on_game_over(&mut self, cause: Option<DeathCause>) {
        let cause = cause.map_or("Unknown", |c| c.as_str());
        self.set_text("death-cause", cause);
        self.show("game-over", true);
    }

    fn on_kill(&mut self) {
        // Score already carries the kill
    }

    fn on_round_end(&mut self) {
        self.show("round-over", true);
    }

    fn on_player_update(&mut self, pos: Vec2) {
        self.set_text("hud-position", &format!("{:.0}, {:.0}", pos.x, pos.y));
    }
}
