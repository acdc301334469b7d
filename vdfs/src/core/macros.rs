#[macro_export]
macro_rules! vd_error_wiring {
    (
        top => $top:ty {
            $($top_src:ty : $top_variant:ident),+ $(,)?   // sub-errors -> VdError::<Variant>
        },
        str_into => [ $($str_tgt:ty),* $(,)? ] $(,)?      // &str -> each tgt::Other + top::Other
    ) => {
        $(
            impl From<$top_src> for $top {
                #[inline]
                fn from(e: $top_src) -> Self { <$top>::$top_variant(e) }
            }
        )+

        $(
            impl From<&'static str> for $str_tgt {
                #[inline]
                fn from(msg: &'static str) -> Self { <$str_tgt>::Other(msg) }
            }
        )*
        impl From<&'static str> for $top {
            #[inline]
            fn from(msg: &'static str) -> Self { <$top>::Other(msg) }
        }
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into());
    };
}
