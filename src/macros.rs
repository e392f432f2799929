/// Declares a `pub const` [MetricName](crate::metric::MetricName).
///
/// ```
/// use gstat::metric;
///
/// metric!(ORDERS_PLACED, "shop.orders.placed");
/// assert_eq!(ORDERS_PLACED.get_name(), "shop.orders.placed");
/// ```
#[macro_export]
macro_rules! metric {
    ( $binding:ident, $metric_name:literal ) => {
        pub const $binding: $crate::metric::MetricName<'static> =
            $crate::metric::MetricName::new($metric_name);
    };
}
