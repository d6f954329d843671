use std::sync::atomic::{AtomicU64, Ordering};

use libc::c_ulong;

use super::interposer_work;
use crate::gtk::XDisplay;
use crate::reals::RealSymbol;

type SwapBuffersFn = unsafe extern "C" fn(*mut XDisplay, c_ulong);

static REAL_SWAP_BUFFERS: RealSymbol = RealSymbol::next(c"glXSwapBuffers", "GLX");

/// Numbers the swap lines; never reset
static SWAPS: AtomicU64 = AtomicU64::new(0);

#[allow(non_snake_case)]
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn glXSwapBuffers(dpy: *mut XDisplay, drawable: c_ulong) {
    let real: SwapBuffersFn = get_real!(REAL_SWAP_BUFFERS, ());
    real(dpy, drawable);
    let n = SWAPS.fetch_add(1, Ordering::Relaxed);
    interposer_work(|| trace_line!(Glx, "Swap {}", n));
}
