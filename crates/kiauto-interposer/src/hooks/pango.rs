use libc::{c_char, c_int};

use super::interposer_work;
use crate::filter::LayoutTextFilter;
use crate::gtk::PangoLayout;
use crate::reals::RealSymbol;
use crate::state::SiteCell;
use crate::trace::CText;

type SetTextFn = unsafe extern "C" fn(*mut PangoLayout, *const c_char, c_int);

static REAL_SET_TEXT: RealSymbol = RealSymbol::next(c"pango_layout_set_text", "PANGO");

/// Layout runs on the GTK main thread only
static LAST_TEXT: SiteCell<LayoutTextFilter> = SiteCell::new(LayoutTextFilter::new());

#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn pango_layout_set_text(
    layout: *mut PangoLayout,
    text: *const c_char,
    length: c_int,
) {
    let real: SetTextFn = get_real!(REAL_SET_TEXT, ());
    real(layout, text, length);
    interposer_work(|| {
        let text = layout_text(text, length);
        let ignored = &kiauto_config::tables().pango;
        if LAST_TEXT.with(|filter| filter.admit(text.as_bytes(), ignored)) {
            trace_line!(Pango, "{}", text);
        }
    });
}

/// `length` is in bytes; negative means NUL-terminated
unsafe fn layout_text<'a>(text: *const c_char, length: c_int) -> CText<'a> {
    if text.is_null() || length < 0 {
        return CText::from_ptr(text);
    }
    CText::from_bytes(std::slice::from_raw_parts(
        text.cast::<u8>(),
        length as usize,
    ))
}
