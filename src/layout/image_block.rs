//! # Image Blocks
//!
//! A titled card holding one or more framed images side by side, each with a
//! caption. Images keep their aspect ratio inside the frame; a slot without
//! an image shows a placeholder instead.

use crate::image_loader::LoadedImage;
use crate::style::Palette;
use crate::text::TextLayout;

use super::card::{CARD_PADDING, CARD_TITLE_HEIGHT, COLUMN_GAP, LABEL_STYLE, TITLE_STYLE, VALUE_STYLE};
use super::flow::PageFlow;
use super::{baseline_below, fit_image, LayoutBlock, Stroke};

pub const PLACEHOLDER: &str = "Kein Bild";
/// Space between the caption and the frame.
const CAPTION_GAP: f64 = 4.0;
/// Inner margin between frame border and image.
const FRAME_INSET: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub caption: String,
    pub image: Option<LoadedImage>,
}

impl ImageSlot {
    pub fn new(caption: impl Into<String>, image: Option<LoadedImage>) -> Self {
        Self {
            caption: caption.into(),
            image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageBlock {
    pub title: String,
    pub slots: Vec<ImageSlot>,
    pub frame_height: f64,
}

impl ImageBlock {
    pub fn new(title: impl Into<String>, slots: Vec<ImageSlot>, frame_height: f64) -> Self {
        Self {
            title: title.into(),
            slots,
            frame_height,
        }
    }
}

pub struct ImageBlockRenderer<'a> {
    text: &'a TextLayout,
}

impl<'a> ImageBlockRenderer<'a> {
    pub fn new(text: &'a TextLayout) -> Self {
        Self { text }
    }

    pub fn measure(&self, block: &ImageBlock) -> f64 {
        CARD_PADDING
            + CARD_TITLE_HEIGHT
            + LABEL_STYLE.line_height
            + CAPTION_GAP
            + block.frame_height
            + CARD_PADDING
    }

    /// Width of each slot's frame when `count` slots share `width`.
    pub fn slot_width(width: f64, count: usize) -> f64 {
        let count = count.max(1) as f64;
        (width - 2.0 * CARD_PADDING - (count - 1.0) * COLUMN_GAP) / count
    }

    pub fn render(&self, flow: &mut PageFlow, block: &ImageBlock) -> LayoutBlock {
        let x = flow.geometry().content_left();
        let width = flow.geometry().content_width();
        let height = self.measure(block);

        flow.ensure_space(height);
        let top = flow.cursor().y();
        let page_index = flow.page_index();
        let page = flow.page();

        page.panel(
            x,
            top - height,
            width,
            height,
            Palette::SURFACE,
            Stroke::new(Palette::BORDER, 0.6),
        );
        page.text(
            x + CARD_PADDING,
            baseline_below(top - CARD_PADDING, &TITLE_STYLE),
            self.text.elide(&block.title, &TITLE_STYLE, width - 2.0 * CARD_PADDING),
            &TITLE_STYLE,
            Palette::INK,
        );

        let slot_w = Self::slot_width(width, block.slots.len());
        let caption_top = top - CARD_PADDING - CARD_TITLE_HEIGHT;
        let frame_top = caption_top - LABEL_STYLE.line_height - CAPTION_GAP;
        let frame_bottom = frame_top - block.frame_height;

        for (i, slot) in block.slots.iter().enumerate() {
            let slot_x = x + CARD_PADDING + i as f64 * (slot_w + COLUMN_GAP);
            page.text(
                slot_x,
                baseline_below(caption_top, &LABEL_STYLE),
                self.text.elide(&slot.caption.to_uppercase(), &LABEL_STYLE, slot_w),
                &LABEL_STYLE,
                Palette::ACCENT,
            );
            page.stroke_rect(
                slot_x,
                frame_bottom,
                slot_w,
                block.frame_height,
                Stroke::new(Palette::RULE, 0.5),
            );

            let inner_w = slot_w - 2.0 * FRAME_INSET;
            let inner_h = block.frame_height - 2.0 * FRAME_INSET;
            match &slot.image {
                Some(image) => {
                    let (dx, dy, w, h) =
                        fit_image(image.width_px, image.height_px, inner_w, inner_h);
                    if w > 0.0 && h > 0.0 {
                        page.image(
                            slot_x + FRAME_INSET + dx,
                            frame_bottom + FRAME_INSET + dy,
                            w,
                            h,
                            image.clone(),
                        );
                    }
                }
                None => {
                    let text_w = self.text.measure(PLACEHOLDER, &VALUE_STYLE);
                    page.text(
                        slot_x + (slot_w - text_w).max(0.0) / 2.0,
                        frame_bottom + block.frame_height / 2.0 - VALUE_STYLE.size * 0.35,
                        PLACEHOLDER,
                        &VALUE_STYLE,
                        Palette::MUTED,
                    );
                }
            }
        }

        flow.advance(height);
        LayoutBlock {
            x,
            top,
            width,
            height,
            page: page_index,
        }
    }
}
