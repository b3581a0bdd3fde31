//! Closed-set dynamic dispatch without allocation.

#![no_std]

pub use macros::bundle;

/// Access to the value held by a bundle
/// through the bundle's common trait.
///
/// Implemented by `#[bundle(Trait)]` as `Bundle<dyn Trait>`.
pub trait Bundle<T: ?Sized> {
    fn inner(&mut self) -> &mut T;

    fn inner_ref(&self) -> &T;
}

#[cfg(test)]
mod tests {
    use crate as dispatch_bundle; // for the proc macro
    use dispatch_bundle::{bundle, Bundle};

    trait Foo {
        fn bar(&self) -> u8;

        fn bump(&mut self) {}
    }

    #[derive(Clone)]
    struct A;
    #[derive(Clone)]
    struct B;
    #[derive(Clone)]
    struct C {
        count: u8,
    }

    impl Foo for A {
        fn bar(&self) -> u8 {
            0
        }
    }

    impl Foo for B {
        fn bar(&self) -> u8 {
            1
        }
    }

    impl Foo for C {
        fn bar(&self) -> u8 {
            self.count
        }

        fn bump(&mut self) {
            self.count += 1;
        }
    }

    #[bundle(Foo)]
    #[derive(Clone)]
    enum MyBundle {
        A,
        B,
        C(C),
    }

    #[test]
    fn basic() {
        let mut bundle = MyBundle::B(B);

        assert_eq!(1, bundle.inner().bar());
        assert_eq!(1, bundle.inner_ref().bar());
    }

    #[test]
    fn conversion() {
        let bundle: MyBundle = A.into();

        assert_eq!(0, bundle.inner_ref().bar());
    }

    #[test]
    fn mutation() {
        let mut bundles = [MyBundle::from(A), C { count: 2 }.into()];

        for bundle in bundles.iter_mut() {
            bundle.inner().bump();
        }

        assert_eq!(0, bundles[0].inner_ref().bar());
        assert_eq!(3, bundles[1].inner_ref().bar());

        // clones are independent
        let mut copy = bundles[1].clone();
        copy.inner().bump();

        assert_eq!(3, bundles[1].inner_ref().bar());
        assert_eq!(4, copy.inner_ref().bar());
    }

    #[test]
    fn generic_dispatch() {
        fn total<D: Bundle<dyn Foo>>(bundles: &[D]) -> u8 {
            bundles.iter().map(|bundle| bundle.inner_ref().bar()).sum()
        }

        let bundles: [MyBundle; 3] = [A.into(), B.into(), C { count: 5 }.into()];

        assert_eq!(6, total(&bundles));
    }

    #[test]
    fn generics() {
        trait Foo {}
        trait Bar {}

        impl Foo for u8 {}
        impl Bar for u8 {}

        struct A<T: Bar> {
            #[allow(unused)]
            val: T,
        }
        struct B;
        struct C<T: Foo> {
            #[allow(unused)]
            val: T,
        }

        impl<T: Bar> Foo for A<T> {}
        impl Foo for B {}
        impl<T: Foo> Foo for C<T> {}

        #[bundle(Foo)]
        enum MyBundle<T: Bar, U: Foo> {
            A(A<T>),
            B,
            C(C<U>),
        }

        let mut bundle: MyBundle<_, B> = A { val: 0u8 }.into();
        let _: &mut dyn Foo = bundle.inner();

        let _bundle: MyBundle<u8, _> = C { val: B }.into();
    }
}
