pub mod emitter;
pub mod invoice;
pub mod product;

#[cfg(test)]
pub(crate) mod testing;
