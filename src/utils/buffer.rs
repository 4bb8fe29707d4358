use std::cell::RefCell;
use std::rc::Rc;

use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::float::Float;

pub enum ComplexComponent {
    Re,
    Im,
}

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

pub fn copy_real_to_complex<T: Float>(
    input: &[T],
    output: &mut [Complex<T>],
    component: ComplexComponent,
) {
    assert!(input.len() <= output.len());
    match component {
        ComplexComponent::Re => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.re = *i;
            o.im = T::zero();
        }),
        ComplexComponent::Im => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.im = *i;
            o.re = T::zero();
        }),
    }
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

pub fn copy_complex_to_real<T: Float>(
    input: &[Complex<T>],
    output: &mut [T],
    component: ComplexComponent,
) {
    assert!(input.len() <= output.len());
    match component {
        ComplexComponent::Re => input
            .iter()
            .map(|c| c.re)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
        ComplexComponent::Im => input
            .iter()
            .map(|c| c.im)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
    }

    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = T::zero());
}

/// Computes |x|^2 for each complex value x in `arr`, scaled by `scale`.
/// This function modifies `arr` in place and leaves the complex component zero.
pub fn modulus_squared<T: Float>(arr: &mut [Complex<T>], scale: T) {
    for s in arr {
        s.re = (s.re * s.re + s.im * s.im) * scale;
        s.im = T::zero();
    }
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T: Float>(arr: &[T]) -> T {
    arr.iter().map(|&s| s * s).sum::<T>()
}

type Shared<B> = Rc<RefCell<B>>;

/// A pool of real/complex scratch buffers, all of length `buffer_size`.
///
/// A buffer handed out by the pool stays reserved while its handle is alive. Once every
/// handle is dropped the buffer goes back to the pool and is handed out again on the
/// next request, so a detector that processes thousands of frames only allocates on the
/// first one.
///
/// ```rust
/// use pitch_notes::utils::buffer::BufferPool;
///
/// let mut buffers = BufferPool::<f32>::new(3);
/// let held = buffers.get_real_buffer();
/// held.borrow_mut()[0] = 5.5;
/// {
///     let scratch = buffers.get_real_buffer();
///     scratch.borrow_mut()[1] = 6.6;
/// }
/// // `scratch` was released, so it is reused here.
/// let reused = buffers.get_real_buffer();
/// assert_eq!(&reused.borrow()[..], &[0.0, 6.6, 0.0]);
/// assert_eq!(buffers.real_buffer_count(), 2);
/// ```
pub struct BufferPool<T> {
    real_buffers: Vec<Shared<Vec<T>>>,
    complex_buffers: Vec<Shared<Vec<Complex<T>>>>,
    pub buffer_size: usize,
}

impl<T: Float> BufferPool<T> {
    pub fn new(buffer_size: usize) -> Self {
        BufferPool {
            real_buffers: vec![],
            complex_buffers: vec![],
            buffer_size,
        }
    }

    /// Get a buffer that stays reserved until every clone of the handle is dropped.
    pub fn get_real_buffer(&mut self) -> Shared<Vec<T>> {
        if let Some(free) = self
            .real_buffers
            .iter()
            .find(|buf| Rc::strong_count(buf) == 1)
        {
            return Rc::clone(free);
        }
        let buf = Rc::new(RefCell::new(new_real_buffer(self.buffer_size)));
        self.real_buffers.push(Rc::clone(&buf));
        buf
    }

    /// Get a buffer that stays reserved until every clone of the handle is dropped.
    pub fn get_complex_buffer(&mut self) -> Shared<Vec<Complex<T>>> {
        if let Some(free) = self
            .complex_buffers
            .iter()
            .find(|buf| Rc::strong_count(buf) == 1)
        {
            return Rc::clone(free);
        }
        let buf = Rc::new(RefCell::new(new_complex_buffer(self.buffer_size)));
        self.complex_buffers.push(Rc::clone(&buf));
        buf
    }

    pub fn real_buffer_count(&self) -> usize {
        self.real_buffers.len()
    }

    pub fn complex_buffer_count(&self) -> usize {
        self.complex_buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_reused_after_release() {
        let mut buffers = BufferPool::<f64>::new(3);
        let held = buffers.get_real_buffer();
        held.borrow_mut()[0] = 5.5;
        {
            let scratch = buffers.get_real_buffer();
            scratch.borrow_mut()[1] = 6.6;
        }
        {
            let scratch = buffers.get_real_buffer();
            scratch.borrow_mut()[2] = 7.7;
        }
        assert_eq!(buffers.real_buffer_count(), 2);
        drop(held);

        let first = buffers.get_real_buffer();
        let second = buffers.get_real_buffer();
        assert_eq!(&first.borrow()[..], &[5.5, 0., 0.]);
        assert_eq!(&second.borrow()[..], &[0.0, 6.6, 7.7]);
        assert_eq!(buffers.real_buffer_count(), 2);
    }

    #[test]
    fn complex_buffers_grow_on_demand() {
        let mut buffers = BufferPool::<f32>::new(4);
        let a = buffers.get_complex_buffer();
        let b = buffers.get_complex_buffer();
        assert_eq!(buffers.complex_buffer_count(), 2);
        assert_eq!(a.borrow().len(), 4);
        drop((a, b));
        let _c = buffers.get_complex_buffer();
        assert_eq!(buffers.complex_buffer_count(), 2);
    }

    #[test]
    fn copy_real_to_complex_zero_fills_the_tail() {
        let mut out = vec![Complex::new(9.0f32, 9.0); 4];
        copy_real_to_complex(&[1.0, 2.0], &mut out, ComplexComponent::Re);
        assert_eq!(
            out,
            vec![
                Complex::new(1.0, 0.0),
                Complex::new(2.0, 0.0),
                Complex::zero(),
                Complex::zero()
            ]
        );
    }
}
