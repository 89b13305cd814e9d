use crate::Request;

/// Supplies validated requests to the controller. `None` means end of input.
pub trait RequestSource {
    fn next_request(&mut self) -> Option<Request>;
}

impl<I> RequestSource for I
where
    I: Iterator<Item = Request>,
{
    fn next_request(&mut self) -> Option<Request> {
        self.next()
    }
}
