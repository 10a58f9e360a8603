// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui implementation of the node graph backend.
//!
//! Features:
//! - Grid background that follows panning
//! - Nodes with title bar, text rows and pins
//! - Links as bezier curves, highlighted when hovered or selected
//! - Click, shift-click and box selection
//! - Node dragging and middle-button panning
//! - Link creation by dragging between pins
//! - Link detaching by dragging off an input pin or Ctrl+click
//! - Optional menu bar row

use crate::attribute::{AttributeKind, PinShape};
use crate::backend::{ChildRegion, NodeGraphBackend};
use crate::config::WindowFlags;
use crate::context::{DeclaredAttribute, DeclaredNode, EditorContext, Interaction};
use crate::id::BackendId;
use egui::{Color32, FontId, Modifiers, PointerButton, Pos2, Rect, Response, Sense, Shape, Stroke, Vec2};

/// Node visual dimensions
const NODE_WIDTH: f32 = 160.0;
const NODE_HEADER_HEIGHT: f32 = 24.0;
const NODE_PADDING: f32 = 4.0;
const LINE_HEIGHT: f32 = 18.0;
const PIN_RADIUS: f32 = 5.0;
const PIN_PADDING: f32 = 12.0;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;

/// Link visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const BEZIER_SEGMENTS: usize = 32;
const LINK_THICKNESS: f32 = 2.5;
const LINK_HOVER_DISTANCE: f32 = 6.0;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

/// Menu bar parameters
const MENU_BAR_HEIGHT: f32 = 20.0;
const MENU_PADDING: f32 = 8.0;

const SELECTION_COLOR: Color32 = Color32::from_rgb(100, 150, 255);

/// Screen-space pin of a declared attribute
#[derive(Debug, Clone, Copy)]
struct PinLayout {
    id: BackendId,
    node: BackendId,
    kind: AttributeKind,
    shape: PinShape,
    pos: Pos2,
}

#[derive(Debug)]
struct RowLayout {
    top: f32,
    kind: AttributeKind,
    lines: Vec<String>,
}

#[derive(Debug)]
struct NodeLayout {
    id: BackendId,
    rect: Rect,
    draggable: bool,
    title: Option<String>,
    rows: Vec<RowLayout>,
}

/// Screen-space layout of everything declared this frame
#[derive(Debug, Default)]
struct Layout {
    nodes: Vec<NodeLayout>,
    pins: Vec<PinLayout>,
}

impl Layout {
    fn build(ctx: &EditorContext) -> Self {
        let mut layout = Self::default();
        for node in ctx.declared_nodes() {
            let [x, y] = ctx.node_screen_position(node.id);
            let [w, h] = ctx.node_dimensions(node.id);
            let rect = Rect::from_min_size(Pos2::new(x, y), Vec2::new(w, h));

            let header = if node.title.is_some() { NODE_HEADER_HEIGHT } else { 0.0 };
            let mut top = rect.top() + header + NODE_PADDING;
            let mut rows = Vec::with_capacity(node.attributes.len());
            for attr in &node.attributes {
                let pin_x = match attr.kind {
                    AttributeKind::Input => Some(rect.left()),
                    AttributeKind::Output => Some(rect.right()),
                    AttributeKind::Static => None,
                };
                if let Some(pin_x) = pin_x {
                    layout.pins.push(PinLayout {
                        id: attr.id,
                        node: node.id,
                        kind: attr.kind,
                        shape: attr.shape,
                        pos: Pos2::new(pin_x, top + LINE_HEIGHT / 2.0),
                    });
                }
                rows.push(RowLayout {
                    top,
                    kind: attr.kind,
                    lines: attr.lines.clone(),
                });
                top += row_height(attr);
            }

            layout.nodes.push(NodeLayout {
                id: node.id,
                rect,
                draggable: node.draggable,
                title: node.title.clone(),
                rows,
            });
        }
        layout
    }

    fn pin(&self, id: BackendId) -> Option<&PinLayout> {
        self.pins.iter().find(|pin| pin.id == id)
    }

    fn pin_at(&self, pos: Pos2) -> Option<&PinLayout> {
        self.pins
            .iter()
            .rev()
            .find(|pin| pin.pos.distance(pos) < PIN_RADIUS * 1.5)
    }

    /// Topmost node under `pos`
    fn node_at(&self, depth_order: &[BackendId], pos: Pos2) -> Option<&NodeLayout> {
        depth_order.iter().rev().find_map(|id| {
            self.nodes
                .iter()
                .find(|node| node.id == *id && node.rect.contains(pos))
        })
    }

    /// Curve endpoints of a link, output side first
    fn link_ends(&self, start: BackendId, end: BackendId) -> Option<(Pos2, Pos2)> {
        let (a, b) = (self.pin(start)?, self.pin(end)?);
        Some(if a.kind == AttributeKind::Input {
            (b.pos, a.pos)
        } else {
            (a.pos, b.pos)
        })
    }

    fn can_connect(&self, from: BackendId, to: BackendId) -> bool {
        match (self.pin(from), self.pin(to)) {
            (Some(a), Some(b)) => a.node != b.node && a.kind.can_link_to(b.kind),
            _ => false,
        }
    }
}

fn row_height(attr: &DeclaredAttribute) -> f32 {
    attr.lines.len().max(1) as f32 * LINE_HEIGHT
}

/// Size of a declared node
fn measure(node: &DeclaredNode) -> [f32; 2] {
    let header = if node.title.is_some() { NODE_HEADER_HEIGHT } else { 0.0 };
    let rows: f32 = node.attributes.iter().map(row_height).sum();
    [
        node.width.unwrap_or(NODE_WIDTH),
        header + rows + 2.0 * NODE_PADDING,
    ]
}

fn to_pos(p: [f32; 2]) -> Pos2 {
    Pos2::new(p[0], p[1])
}

fn to_array(p: Pos2) -> [f32; 2] {
    [p.x, p.y]
}

/// Node graph backend drawing into an egui [`egui::Ui`]
pub struct EguiNodeBackend<'a> {
    ui: &'a mut egui::Ui,
    id: egui::Id,
    flags: WindowFlags,
    region: Rect,
    menu_rect: Rect,
    canvas: Rect,
    menu_cursor: f32,
}

impl<'a> EguiNodeBackend<'a> {
    /// Create a backend drawing into `ui`
    pub fn new(ui: &'a mut egui::Ui) -> Self {
        let id = ui.id();
        Self {
            ui,
            id,
            flags: WindowFlags::NONE,
            region: Rect::NOTHING,
            menu_rect: Rect::NOTHING,
            canvas: Rect::NOTHING,
            menu_cursor: 0.0,
        }
    }

    /// Canvas rectangle of the current child region
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    fn handle_input(&mut self, ctx: &mut EditorContext, layout: &Layout) {
        let response = self
            .ui
            .interact(self.canvas, self.id.with("canvas"), Sense::click_and_drag());
        let (pointer, press_origin, modifiers) = self.ui.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.press_origin(),
                i.modifiers,
            )
        });
        let pointer = pointer.filter(|pos| self.canvas.contains(*pos));

        let hovered_pin = pointer.and_then(|pos| layout.pin_at(pos)).map(|pin| pin.id);
        let hovered_node = match (hovered_pin, pointer) {
            (None, Some(pos)) => layout.node_at(ctx.depth_order(), pos).map(|node| node.id),
            _ => None,
        };
        let hovered_link = match (hovered_pin, hovered_node, pointer) {
            (None, None, Some(pos)) => link_at(ctx, layout, pos),
            _ => None,
        };
        ctx.set_editor_hovered(response.hovered());
        ctx.set_hovered_node(hovered_node);
        ctx.set_hovered_link(hovered_link);

        let pointer = pointer.or(press_origin).unwrap_or(self.canvas.center());
        ctx.interaction = match std::mem::take(&mut ctx.interaction) {
            Interaction::Idle => {
                self.idle(ctx, layout, &response, press_origin.unwrap_or(pointer), modifiers)
            }

            Interaction::Panning => {
                pan(ctx, response.drag_delta());
                if response.drag_stopped() || !response.dragged() {
                    Interaction::Idle
                } else {
                    Interaction::Panning
                }
            }

            Interaction::DraggingNodes => {
                drag_selected(ctx, layout, response.drag_delta());
                if response.drag_stopped() || !response.dragged() {
                    Interaction::Idle
                } else {
                    Interaction::DraggingNodes
                }
            }

            Interaction::CreatingLink { from, .. } => {
                if response.drag_stopped() || !response.dragged() {
                    if let Some(to) = layout.pin_at(pointer).map(|pin| pin.id) {
                        if layout.can_connect(from, to) {
                            ctx.emit_link_created(from, to);
                        }
                    }
                    Interaction::Idle
                } else {
                    Interaction::CreatingLink {
                        from,
                        pointer: to_array(pointer),
                    }
                }
            }

            Interaction::BoxSelect { start, .. } => {
                if response.drag_stopped() || !response.dragged() {
                    let selection = Rect::from_two_pos(to_pos(start), pointer);
                    if !modifiers.shift {
                        ctx.clear_node_selection();
                    }
                    for node in &layout.nodes {
                        if selection.intersects(node.rect) {
                            ctx.select_node(node.id);
                        }
                    }
                    Interaction::Idle
                } else {
                    Interaction::BoxSelect {
                        start,
                        current: to_array(pointer),
                    }
                }
            }
        };
    }

    fn idle(
        &self,
        ctx: &mut EditorContext,
        layout: &Layout,
        response: &Response,
        origin: Pos2,
        modifiers: Modifiers,
    ) -> Interaction {
        if response.drag_started_by(PointerButton::Middle) {
            pan(ctx, response.drag_delta());
            return Interaction::Panning;
        }

        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pin) = layout.pin_at(origin).copied() {
                if pin.kind == AttributeKind::Input {
                    let attached = ctx
                        .declared_links()
                        .iter()
                        .rev()
                        .find(|link| link.start == pin.id || link.end == pin.id)
                        .copied();
                    if let Some(link) = attached {
                        let other = if link.start == pin.id { link.end } else { link.start };
                        ctx.emit_link_destroyed(link.id);
                        return Interaction::CreatingLink {
                            from: other,
                            pointer: to_array(origin),
                        };
                    }
                }
                return Interaction::CreatingLink {
                    from: pin.id,
                    pointer: to_array(origin),
                };
            }

            if let Some(node) = layout.node_at(ctx.depth_order(), origin) {
                let (id, draggable) = (node.id, node.draggable);
                if !ctx.is_node_selected(id) {
                    if !modifiers.shift {
                        ctx.clear_node_selection();
                        ctx.clear_link_selection();
                    }
                    ctx.select_node(id);
                }
                ctx.bring_to_front(id);
                if draggable {
                    drag_selected(ctx, layout, response.drag_delta());
                    return Interaction::DraggingNodes;
                }
                return Interaction::Idle;
            }

            return Interaction::BoxSelect {
                start: to_array(origin),
                current: to_array(origin),
            };
        }

        if response.clicked_by(PointerButton::Primary) {
            let pos = response.interact_pointer_pos().unwrap_or(origin);
            if layout.pin_at(pos).is_some() {
                return Interaction::Idle;
            }
            if let Some(id) = layout.node_at(ctx.depth_order(), pos).map(|node| node.id) {
                if modifiers.shift {
                    if ctx.is_node_selected(id) {
                        ctx.deselect_node(id);
                    } else {
                        ctx.select_node(id);
                    }
                } else {
                    ctx.clear_node_selection();
                    ctx.clear_link_selection();
                    ctx.select_node(id);
                }
                ctx.bring_to_front(id);
            } else if let Some(link) = link_at(ctx, layout, pos) {
                if modifiers.command || modifiers.ctrl {
                    ctx.emit_link_destroyed(link);
                } else {
                    if !modifiers.shift {
                        ctx.clear_node_selection();
                        ctx.clear_link_selection();
                    }
                    ctx.select_link(link);
                }
            } else if !modifiers.shift {
                ctx.clear_node_selection();
                ctx.clear_link_selection();
            }
        }

        Interaction::Idle
    }

    fn paint(&self, ctx: &EditorContext, layout: &Layout) {
        let painter = self.ui.painter_at(self.canvas);
        painter.rect_filled(self.canvas, 0.0, Color32::from_rgb(28, 28, 31));
        draw_grid(&painter, self.canvas, ctx.panning());

        for link in ctx.declared_links() {
            let Some((from, to)) = layout.link_ends(link.start, link.end) else {
                continue;
            };
            let color = if ctx.is_link_selected(link.id) {
                Color32::WHITE
            } else if ctx.is_link_hovered(link.id) {
                Color32::from_rgb(150, 190, 240)
            } else {
                Color32::from_rgb(90, 130, 200)
            };
            draw_bezier_link(&painter, from, to, color);
        }

        if let Interaction::CreatingLink { from, pointer } = &ctx.interaction {
            if let Some(pin) = layout.pin(*from) {
                let color = Color32::from_gray(200);
                if pin.kind == AttributeKind::Output {
                    draw_bezier_link(&painter, pin.pos, to_pos(*pointer), color);
                } else {
                    draw_bezier_link(&painter, to_pos(*pointer), pin.pos, color);
                }
            }
        }

        let mouse_pos = self.ui.input(|i| i.pointer.hover_pos());
        for id in ctx.depth_order() {
            if let Some(node) = layout.nodes.iter().find(|node| node.id == *id) {
                draw_node(&painter, ctx, node);
                for pin in layout.pins.iter().filter(|pin| pin.node == node.id) {
                    let hovered = mouse_pos.is_some_and(|pos| pin.pos.distance(pos) < PIN_RADIUS * 1.5);
                    draw_pin(&painter, pin, hovered);
                }
            }
        }

        if let Interaction::BoxSelect { start, current } = &ctx.interaction {
            let rect = Rect::from_two_pos(to_pos(*start), to_pos(*current));
            painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, SELECTION_COLOR));
        }
    }
}

impl NodeGraphBackend for EguiNodeBackend<'_> {
    fn begin_child(&mut self, label: &str, size: [f32; 2], flags: WindowFlags) -> ChildRegion {
        let available = self.ui.available_size();
        let size = Vec2::new(
            if size[0] > 0.0 { size[0] } else { available.x },
            if size[1] > 0.0 { size[1] } else { available.y },
        );
        let (rect, _) = self.ui.allocate_exact_size(size, Sense::hover());

        let menu_height = if flags.contains(WindowFlags::MENU_BAR) {
            MENU_BAR_HEIGHT
        } else {
            0.0
        };
        self.id = self.ui.make_persistent_id(label);
        self.flags = flags;
        self.region = rect;
        self.menu_rect = Rect::from_min_size(rect.min, Vec2::new(rect.width(), menu_height));
        self.canvas = Rect::from_min_max(Pos2::new(rect.left(), rect.top() + menu_height), rect.max);
        ChildRegion {
            min: to_array(rect.min),
            size: [rect.width(), rect.height()],
        }
    }

    fn end_child(&mut self) {
        self.ui
            .painter()
            .rect_stroke(self.region, 0.0, Stroke::new(1.0, Color32::from_gray(60)));
    }

    fn begin_menu_bar(&mut self) -> bool {
        if !self.flags.contains(WindowFlags::MENU_BAR) {
            return false;
        }
        self.ui
            .painter()
            .rect_filled(self.menu_rect, 0.0, Color32::from_rgb(40, 40, 44));
        self.menu_cursor = self.menu_rect.left();
        true
    }

    fn menu_entry(&mut self, label: &str) -> bool {
        let painter = self.ui.painter();
        let galley = painter.layout_no_wrap(
            label.to_owned(),
            FontId::proportional(13.0),
            Color32::from_gray(220),
        );
        let rect = Rect::from_min_size(
            Pos2::new(self.menu_cursor, self.menu_rect.top()),
            Vec2::new(galley.size().x + 2.0 * MENU_PADDING, self.menu_rect.height()),
        );
        let response = self
            .ui
            .interact(rect, self.id.with(("menu", label)), Sense::click());
        if response.hovered() {
            painter.rect_filled(rect, 2.0, Color32::from_gray(60));
        }
        let text_pos = Pos2::new(
            rect.left() + MENU_PADDING,
            rect.center().y - galley.size().y / 2.0,
        );
        painter.galley(text_pos, galley, Color32::from_gray(220));
        self.menu_cursor = rect.right();
        response.clicked()
    }

    fn begin_node_editor(&mut self, ctx: &mut EditorContext) {
        ctx.begin_frame();
        ctx.set_canvas_origin(to_array(self.canvas.min));
    }

    fn end_node_editor(&mut self, ctx: &mut EditorContext) {
        let sizes: Vec<_> = ctx
            .declared_nodes()
            .iter()
            .map(|node| (node.id, measure(node)))
            .collect();
        for (id, size) in sizes {
            ctx.set_node_dimensions(id, size);
        }

        let layout = Layout::build(ctx);
        self.handle_input(ctx, &layout);

        // Positions may have moved during input handling
        let layout = Layout::build(ctx);
        self.paint(ctx, &layout);

        ctx.end_frame();
    }
}

fn pan(ctx: &mut EditorContext, delta: Vec2) {
    let [x, y] = ctx.panning();
    ctx.reset_panning([x + delta.x, y + delta.y]);
}

fn drag_selected(ctx: &mut EditorContext, layout: &Layout, delta: Vec2) {
    if delta == Vec2::ZERO {
        return;
    }
    let moving: Vec<_> = layout
        .nodes
        .iter()
        .filter(|node| node.draggable && ctx.is_node_selected(node.id))
        .map(|node| node.id)
        .collect();
    for id in moving {
        let [x, y] = ctx.node_grid_position(id);
        ctx.set_node_grid_position(id, [x + delta.x, y + delta.y]);
    }
}

/// Topmost declared link passing near `pos`
fn link_at(ctx: &EditorContext, layout: &Layout, pos: Pos2) -> Option<BackendId> {
    ctx.declared_links()
        .iter()
        .rev()
        .find(|link| {
            layout.link_ends(link.start, link.end).is_some_and(|(from, to)| {
                link_curve(from, to)
                    .windows(2)
                    .any(|seg| distance_to_segment(pos, seg[0], seg[1]) < LINK_HOVER_DISTANCE)
            })
        })
        .map(|link| link.id)
}

fn draw_grid(painter: &egui::Painter, rect: Rect, panning: [f32; 2]) {
    let major_spacing = GRID_SPACING * 5.0;
    let grid_color_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
    let grid_color_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

    for (spacing, color) in [(GRID_SPACING, grid_color_minor), (major_spacing, grid_color_major)] {
        let mut x = rect.left() + panning[0].rem_euclid(spacing);
        while x < rect.right() {
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(1.0, color),
            );
            x += spacing;
        }

        let mut y = rect.top() + panning[1].rem_euclid(spacing);
        while y < rect.bottom() {
            painter.line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(1.0, color),
            );
            y += spacing;
        }
    }
}

fn draw_node(painter: &egui::Painter, ctx: &EditorContext, node: &NodeLayout) {
    let rect = node.rect;
    let is_selected = ctx.is_node_selected(node.id);

    painter.rect_filled(
        rect.translate(Vec2::splat(NODE_SHADOW_OFFSET)),
        NODE_ROUNDING,
        Color32::from_rgba_unmultiplied(0, 0, 0, 60),
    );

    let bg_color = if is_selected {
        Color32::from_rgb(60, 70, 90)
    } else {
        Color32::from_rgb(45, 45, 48)
    };
    painter.rect_filled(rect, NODE_ROUNDING, bg_color);

    if let Some(title) = &node.title {
        let header_rect = Rect::from_min_size(rect.min, Vec2::new(rect.width(), NODE_HEADER_HEIGHT));
        let header_color = if ctx.is_node_hovered(node.id) {
            Color32::from_rgb(85, 120, 155)
        } else {
            Color32::from_rgb(70, 100, 130)
        };
        painter.rect_filled(
            header_rect,
            egui::Rounding {
                nw: NODE_ROUNDING,
                ne: NODE_ROUNDING,
                sw: 0.0,
                se: 0.0,
            },
            header_color,
        );
        painter.text(
            header_rect.center(),
            egui::Align2::CENTER_CENTER,
            title,
            FontId::proportional(12.0),
            Color32::WHITE,
        );
    }

    for row in &node.rows {
        for (i, line) in row.lines.iter().enumerate() {
            let y = row.top + LINE_HEIGHT * (i as f32 + 0.5);
            let (pos, align) = match row.kind {
                AttributeKind::Input => (Pos2::new(rect.left() + PIN_PADDING, y), egui::Align2::LEFT_CENTER),
                AttributeKind::Output => (Pos2::new(rect.right() - PIN_PADDING, y), egui::Align2::RIGHT_CENTER),
                AttributeKind::Static => (Pos2::new(rect.left() + NODE_PADDING * 2.0, y), egui::Align2::LEFT_CENTER),
            };
            painter.text(pos, align, line, FontId::proportional(11.0), Color32::from_gray(200));
        }
    }

    if is_selected {
        painter.rect_stroke(rect, NODE_ROUNDING, Stroke::new(2.0, SELECTION_COLOR));
    }
}

fn draw_pin(painter: &egui::Painter, pin: &PinLayout, hovered: bool) {
    let radius = if hovered { PIN_RADIUS * 1.3 } else { PIN_RADIUS };
    let color = match pin.kind {
        AttributeKind::Output => Color32::from_rgb(120, 190, 120),
        _ => Color32::from_rgb(190, 160, 100),
    };
    let stroke = Stroke::new(1.5, color);
    let pos = pin.pos;

    match pin.shape {
        PinShape::Circle => {
            painter.circle_stroke(pos, radius, stroke);
        }
        PinShape::CircleFilled => {
            painter.circle_filled(pos, radius, color);
        }
        PinShape::Triangle | PinShape::TriangleFilled => {
            let points = vec![
                pos + Vec2::new(-radius, -radius),
                pos + Vec2::new(radius, 0.0),
                pos + Vec2::new(-radius, radius),
            ];
            if pin.shape.is_filled() {
                painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
            } else {
                painter.add(Shape::closed_line(points, stroke));
            }
        }
        PinShape::Quad => {
            let rect = Rect::from_center_size(pos, Vec2::splat(radius * 2.0));
            painter.rect_stroke(rect, 0.0, stroke);
        }
        PinShape::QuadFilled => {
            let rect = Rect::from_center_size(pos, Vec2::splat(radius * 2.0));
            painter.rect_filled(rect, 0.0, color);
        }
    }

    painter.circle_stroke(pos, radius + 1.0, Stroke::new(1.0, Color32::from_gray(30)));
}

fn draw_bezier_link(painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32) {
    let points = link_curve(from, to);
    for segment in points.windows(2) {
        painter.line_segment([segment[0], segment[1]], Stroke::new(LINK_THICKNESS, color));
    }
}

fn link_curve(from: Pos2, to: Pos2) -> Vec<Pos2> {
    let distance = (to.x - from.x).abs();
    let curvature = BEZIER_CURVATURE.min(distance * 0.5).max(BEZIER_CURVATURE * 0.25);
    let ctrl1 = Pos2::new(from.x + curvature, from.y);
    let ctrl2 = Pos2::new(to.x - curvature, to.y);
    bezier_points(from, ctrl1, ctrl2, to, BEZIER_SEGMENTS)
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::NodeAttribute;
    use crate::bridge::BackendIdentity;
    use crate::callback::{AppData, CallbackRegistry};
    use crate::config::EditorConfigUpdate;
    use crate::editor::NodeEditor;
    use crate::id::ItemId;
    use crate::item::Item;
    use crate::link::NodeLink;
    use crate::node::Node;
    use crate::testing::recorder;
    use egui::Event;

    /// Headless egui host driving one node editor with synthetic input
    struct Host {
        egui: egui::Context,
        editor: NodeEditor,
        callbacks: CallbackRegistry,
    }

    /// Link events reported by the backend while stepping
    #[derive(Debug, Default)]
    struct LinkEvents {
        created: Vec<(BackendId, BackendId)>,
        destroyed: Vec<BackendId>,
    }

    impl LinkEvents {
        fn merge(&mut self, other: LinkEvents) {
            self.created.extend(other.created);
            self.destroyed.extend(other.destroyed);
        }
    }

    fn button(pos: Pos2, button: PointerButton, pressed: bool, modifiers: Modifiers) -> Event {
        Event::PointerButton {
            pos,
            button,
            pressed,
            modifiers,
        }
    }

    impl Host {
        fn new(editor: NodeEditor) -> Self {
            let mut host = Self {
                egui: egui::Context::default(),
                editor,
                callbacks: CallbackRegistry::new(),
            };
            // Lay the nodes out, then let egui know the canvas widget
            host.step(Vec::new(), Modifiers::NONE);
            host.step(Vec::new(), Modifiers::NONE);
            host
        }

        fn step(&mut self, events: Vec<Event>, modifiers: Modifiers) -> LinkEvents {
            let input = egui::RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1024.0, 768.0))),
                events,
                modifiers,
                ..Default::default()
            };
            let Self {
                egui,
                editor,
                callbacks,
            } = self;
            let _ = egui.run(input, |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let mut backend = EguiNodeBackend::new(ui);
                    if editor.pre_draw() {
                        editor.draw(&mut backend, callbacks);
                        editor.post_draw(callbacks);
                    }
                });
            });

            let ctx = self.editor.context();
            LinkEvents {
                created: ctx.link_created().into_iter().collect(),
                destroyed: ctx.link_destroyed().into_iter().collect(),
            }
        }

        fn click(&mut self, pos: Pos2, modifiers: Modifiers) -> LinkEvents {
            let primary = PointerButton::Primary;
            let mut events = self.step(
                vec![Event::PointerMoved(pos), button(pos, primary, true, modifiers)],
                modifiers,
            );
            events.merge(self.step(vec![button(pos, primary, false, modifiers)], modifiers));
            events
        }

        fn drag(&mut self, from: Pos2, to: Pos2, pressed: PointerButton) -> LinkEvents {
            let none = Modifiers::NONE;
            let mut events = self.step(
                vec![Event::PointerMoved(from), button(from, pressed, true, none)],
                none,
            );
            events.merge(self.step(vec![Event::PointerMoved(from.lerp(to, 0.5))], none));
            events.merge(self.step(vec![Event::PointerMoved(to)], none));
            events.merge(self.step(vec![button(to, pressed, false, none)], none));
            events
        }

        fn node_rect(&self, node: ItemId) -> Rect {
            let state = self
                .editor
                .nodes()
                .iter()
                .find(|item| item.id() == node)
                .and_then(Item::state)
                .copied()
                .unwrap_or_default();
            Rect::from_min_max(to_pos(state.rect_min), to_pos(state.rect_max))
        }

        /// First pin on the right (output) or left (input) edge of a node
        fn pin(&self, node: ItemId, output: bool) -> Pos2 {
            let rect = self.node_rect(node);
            let x = if output { rect.right() } else { rect.left() };
            Pos2::new(x, rect.top() + NODE_HEADER_HEIGHT + NODE_PADDING + LINE_HEIGHT / 2.0)
        }

        fn title(&self, node: ItemId) -> Pos2 {
            self.node_rect(node).center_top() + Vec2::new(0.0, NODE_HEADER_HEIGHT / 2.0)
        }

        fn canvas_point(&self, offset: Vec2) -> Pos2 {
            to_pos(self.editor.context().canvas_origin()) + offset
        }
    }

    struct Scene {
        host: Host,
        a: ItemId,
        b: ItemId,
        out: (ItemId, BackendId),
        input: (ItemId, BackendId),
        link: Option<(ItemId, BackendId)>,
    }

    /// Node A with an output at (40, 60), node B with an input at (300, 200)
    fn scene(linked: bool) -> Scene {
        let out = NodeAttribute::output("out");
        let input = NodeAttribute::input("in");
        let out_ids = (out.id(), out.backend_id());
        let in_ids = (input.id(), input.backend_id());
        let a = Node::new("A").with_position(40.0, 60.0).with_attribute(out);
        let b = Node::new("B").with_position(300.0, 200.0).with_attribute(input);
        let (a_id, b_id) = (a.id(), b.id());

        let mut editor = NodeEditor::new();
        editor.attach_child(Item::Node(a), "add_item").unwrap();
        editor.attach_child(Item::Node(b), "add_item").unwrap();
        let link = linked.then(|| {
            let link = NodeLink::new(out_ids.0, in_ids.0);
            let ids = (link.id(), link.backend_id());
            editor.attach_child(Item::NodeLink(link), "add_item").unwrap();
            ids
        });

        Scene {
            host: Host::new(editor),
            a: a_id,
            b: b_id,
            out: out_ids,
            input: in_ids,
            link,
        }
    }

    fn run_frame(mut frame: impl FnMut(&mut egui::Ui)) {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| frame(ui));
        });
    }

    #[test]
    fn test_bezier_endpoints() {
        let from = Pos2::new(0.0, 0.0);
        let to = Pos2::new(100.0, 40.0);
        let points = link_curve(from, to);
        assert_eq!(points.len(), BEZIER_SEGMENTS + 1);
        assert_eq!(points[0], from);
        assert!(points[BEZIER_SEGMENTS].distance(to) < 1e-3);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Pos2::new(1.0, 1.0), a, a), 2.0_f32.sqrt());
    }

    #[test]
    fn test_measure_counts_title_and_lines() {
        let node = DeclaredNode {
            id: BackendId(1),
            title: Some("Add".to_string()),
            width: None,
            draggable: true,
            attributes: vec![
                DeclaredAttribute {
                    id: BackendId(2),
                    kind: AttributeKind::Input,
                    shape: PinShape::CircleFilled,
                    lines: vec!["a".to_string(), "value".to_string()],
                },
                DeclaredAttribute {
                    id: BackendId(3),
                    kind: AttributeKind::Output,
                    shape: PinShape::CircleFilled,
                    lines: Vec::new(),
                },
            ],
        };
        assert_eq!(
            measure(&node),
            [NODE_WIDTH, NODE_HEADER_HEIGHT + 3.0 * LINE_HEIGHT + 2.0 * NODE_PADDING]
        );
    }

    #[test]
    fn test_frame_records_dimensions_and_canvas() {
        let mut ctx = EditorContext::new();
        let node = BackendId::next();
        let attr = BackendId::next();
        let mut canvas = Rect::NOTHING;

        run_frame(|ui| {
            let mut backend = EguiNodeBackend::new(ui);
            backend.begin_child("editor", [400.0, 300.0], WindowFlags::MENU_BAR);
            assert!(backend.begin_menu_bar());
            backend.menu_entry("File");
            backend.end_menu_bar();
            backend.begin_node_editor(&mut ctx);
            backend.set_next_item_width(&mut ctx, 200.0);
            backend.begin_node(&mut ctx, node, true);
            backend.begin_attribute(&mut ctx, attr, AttributeKind::Output, PinShape::Triangle);
            backend.text(&mut ctx, "out");
            backend.end_attribute(&mut ctx);
            backend.end_node(&mut ctx);
            backend.end_node_editor(&mut ctx);
            canvas = backend.canvas();
            backend.end_child();
        });

        assert!(!ctx.is_in_frame());
        assert_eq!(ctx.node_dimensions(node), [200.0, LINE_HEIGHT + 2.0 * NODE_PADDING]);
        assert_eq!(canvas.height(), 300.0 - MENU_BAR_HEIGHT);
        assert_eq!(ctx.canvas_origin(), to_array(canvas.min));
        assert!(!ctx.is_editor_hovered());
    }

    #[test]
    fn test_editor_draws_through_egui() {
        let out = NodeAttribute::output("out");
        let node = Node::new("Source").with_position(30.0, 40.0).with_attribute(out);
        let node_id = node.id();
        let mut editor = NodeEditor::new();
        editor.attach_child(Item::Node(node), "add_item").unwrap();
        let callbacks = CallbackRegistry::new();

        run_frame(|ui| {
            let mut backend = EguiNodeBackend::new(ui);
            if editor.pre_draw() {
                editor.draw(&mut backend, &callbacks);
                editor.post_draw(&callbacks);
            }
        });

        let Some(Item::Node(node)) = editor.nodes().iter().find(|item| item.id() == node_id) else {
            panic!("node missing");
        };
        let state = node.state();
        assert_eq!(node.position(), [30.0, 40.0]);
        assert_eq!(
            state.rect_size,
            [NODE_WIDTH, NODE_HEADER_HEIGHT + LINE_HEIGHT + 2.0 * NODE_PADDING]
        );
        assert_eq!(state.rect_max[0], state.rect_min[0] + NODE_WIDTH);
        assert_eq!(callbacks.run_callbacks(), 0);
    }

    #[test]
    fn test_editor_rect_covers_menu_bar_and_canvas() {
        let update = EditorConfigUpdate {
            width: Some(400),
            height: Some(300),
            ..Default::default()
        };
        let mut editor = NodeEditor::with_config(update.menubar(true));
        let callbacks = CallbackRegistry::new();

        run_frame(|ui| {
            let mut backend = EguiNodeBackend::new(ui);
            if editor.pre_draw() {
                editor.draw(&mut backend, &callbacks);
            }
        });

        let state = editor.state();
        let [x, y] = state.rect_min;
        assert_eq!(state.rect_size, [400.0, 300.0]);
        assert_eq!(state.rect_max, [x + 400.0, y + 300.0]);
        assert_eq!(editor.context().canvas_origin(), [x, y + MENU_BAR_HEIGHT]);
    }

    #[test]
    fn test_dragging_between_pins_creates_link() {
        let mut s = scene(false);
        let (cb, seen) = recorder();
        s.host.editor.configure(EditorConfigUpdate::default().callback(Some(cb)));

        let (from, to) = (s.host.pin(s.a, true), s.host.pin(s.b, false));
        let events = s.host.drag(from, to, PointerButton::Primary);

        assert_eq!(events.created, vec![(s.out.1, s.input.1)]);
        assert!(events.destroyed.is_empty());
        assert_eq!(s.host.callbacks.run_callbacks(), 1);
        assert_eq!(seen.lock()[0].app_data, AppData::Link(s.out.0, s.input.0));
    }

    #[test]
    fn test_link_drag_released_on_empty_canvas_creates_nothing() {
        let mut s = scene(false);
        let from = s.host.pin(s.a, true);
        let to = s.host.canvas_point(Vec2::new(600.0, 500.0));
        let events = s.host.drag(from, to, PointerButton::Primary);

        assert!(events.created.is_empty());
        assert_eq!(s.host.editor.context().interaction, Interaction::Idle);
    }

    #[test]
    fn test_dragging_off_input_pin_detaches_link() {
        let mut s = scene(true);
        let (link_id, link_backend) = s.link.unwrap();
        let (cb, seen) = recorder();
        s.host
            .editor
            .configure(EditorConfigUpdate::default().delink_callback(Some(cb)));

        let from = s.host.pin(s.b, false);
        let events = s.host.drag(from, from + Vec2::new(0.0, 150.0), PointerButton::Primary);

        assert_eq!(events.destroyed, vec![link_backend]);
        assert!(events.created.is_empty());
        assert_eq!(s.host.callbacks.run_callbacks(), 1);
        assert_eq!(seen.lock()[0].app_data, AppData::Delink(link_id));
    }

    #[test]
    fn test_click_selects_link_and_ctrl_click_detaches_it() {
        let mut s = scene(true);
        let (_, link_backend) = s.link.unwrap();
        let middle = s.host.pin(s.a, true).lerp(s.host.pin(s.b, false), 0.5);

        let events = s.host.click(middle, Modifiers::NONE);
        assert!(events.destroyed.is_empty());
        assert_eq!(s.host.editor.selected_links(), vec![(s.out.0, s.input.0)]);

        let events = s.host.click(middle, Modifiers::CTRL);
        assert_eq!(events.destroyed, vec![link_backend]);
        assert!(s.host.editor.selected_links().is_empty());
    }

    #[test]
    fn test_click_shift_click_and_box_selection() {
        let mut s = scene(false);

        s.host.click(s.host.title(s.a), Modifiers::NONE);
        assert_eq!(s.host.editor.selected_nodes(), vec![s.a]);

        s.host.click(s.host.title(s.b), Modifiers::SHIFT);
        assert_eq!(s.host.editor.selected_nodes(), vec![s.a, s.b]);

        s.host.click(s.host.title(s.a), Modifiers::SHIFT);
        assert_eq!(s.host.editor.selected_nodes(), vec![s.b]);

        let empty = s.host.canvas_point(Vec2::new(10.0, 10.0));
        s.host.click(empty, Modifiers::NONE);
        assert!(s.host.editor.selected_nodes().is_empty());

        // Rubber band around node A only
        let corner = s.host.canvas_point(Vec2::new(220.0, 130.0));
        s.host.drag(empty, corner, PointerButton::Primary);
        assert_eq!(s.host.editor.selected_nodes(), vec![s.a]);
    }

    #[test]
    fn test_middle_drag_pans_canvas() {
        let mut s = scene(false);
        let before = s.host.node_rect(s.a).min;

        let from = s.host.canvas_point(Vec2::new(600.0, 400.0));
        let events = s.host.drag(from, from + Vec2::new(50.0, 30.0), PointerButton::Middle);

        let [x, y] = s.host.editor.context().panning();
        assert!((x - 50.0).abs() < 0.5 && (y - 30.0).abs() < 0.5, "panning {x}, {y}");
        let after = s.host.node_rect(s.a).min;
        assert!((after - before - Vec2::new(x, y)).length() < 1e-3);
        assert!(s.host.editor.selected_nodes().is_empty());
        assert!(events.created.is_empty());
    }
}
